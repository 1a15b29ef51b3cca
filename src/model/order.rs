use crate::model::{OrderId, OrderStatus, RestaurantId, SubOrderId, SubOrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// How the customer pays. Settlement happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

/// One ordered dish, with the price captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub food_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(
        food_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            food_id: food_id.into(),
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The part of an order fulfilled by one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubOrder {
    pub id: SubOrderId,
    pub order_id: OrderId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<LineItem>,
    pub status: SubOrderStatus,
}

impl SubOrder {
    /// Σ quantity × unit price.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// Represents a customer checkout and its per-restaurant sub-orders.
///
/// # Actor Framework
/// [`Order`] implements the [`ActorEntity`](crate::framework::ActorEntity) trait, so each
/// order is owned by its own [`ResourceActor`](crate::framework::ResourceActor).
///
/// See [`impl ActorEntity for Order`](#impl-ActorEntity-for-Order) for details on:
/// - Creation parameters ([`NewOrder`])
/// - Actions ([`OrderAction`](crate::order_actor::OrderAction))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub ordered_at: DateTime<Utc>,
    /// In creation order.
    pub sub_orders: Vec<SubOrder>,
    /// Sequence number of the last event this order emitted (`0` = `new_order`).
    pub sequence: u64,
}

impl Order {
    /// The customer-facing status, derived from the sub-orders on every call.
    pub fn status(&self) -> OrderStatus {
        crate::transition::derive_order_status(self.sub_orders.iter().map(|s| s.status))
    }

    pub fn sub_order(&self, id: SubOrderId) -> Option<&SubOrder> {
        self.sub_orders.iter().find(|s| s.id == id)
    }

    pub fn sub_order_ids(&self) -> Vec<SubOrderId> {
        self.sub_orders.iter().map(|s| s.id).collect()
    }

    pub fn total(&self) -> Decimal {
        self.sub_orders.iter().map(SubOrder::subtotal).sum()
    }

    /// An order is frozen once every sub-order is terminal.
    pub fn is_resolved(&self) -> bool {
        self.sub_orders.iter().all(|s| s.status.is_terminal())
    }
}

/// Checkout payload for one restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubOrderCreate {
    pub restaurant_id: RestaurantId,
    pub items: Vec<LineItem>,
}

/// Checkout payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub delivery_address: Option<String>,
    pub sub_orders: Vec<SubOrderCreate>,
}

/// Creation parameters handed to the order actor: the checkout plus the ids the store
/// allocated for its sub-orders.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub request: OrderCreate,
    pub sub_order_ids: Vec<SubOrderId>,
    pub ordered_at: DateTime<Utc>,
}

/// Listing row: an order plus its derived status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order: Order,
    pub status: OrderStatus,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        let status = order.status();
        Self { order, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_order(id: u32, status: SubOrderStatus, items: Vec<LineItem>) -> SubOrder {
        SubOrder {
            id: SubOrderId(id),
            order_id: OrderId(1),
            restaurant_id: RestaurantId::new(format!("r{}", id)),
            items,
            status,
        }
    }

    #[test]
    fn subtotal_sums_quantity_times_price() {
        let sub = sub_order(
            1,
            SubOrderStatus::Pending,
            vec![
                LineItem::new("f1", "Ramen", 2, Decimal::new(1250, 2)),
                LineItem::new("f2", "Gyoza", 1, Decimal::new(600, 2)),
            ],
        );
        assert_eq!(sub.subtotal(), Decimal::new(3100, 2));
    }

    #[test]
    fn status_is_derived_from_sub_orders() {
        let order = Order {
            id: OrderId(1),
            customer: Customer::new("Alice", "555-0100"),
            payment_method: PaymentMethod::Card,
            delivery_address: None,
            ordered_at: Utc::now(),
            sub_orders: vec![
                sub_order(1, SubOrderStatus::Delivered, vec![]),
                sub_order(2, SubOrderStatus::Preparing, vec![]),
            ],
            sequence: 4,
        };
        assert_eq!(order.status(), OrderStatus::Preparing);
        assert!(!order.is_resolved());
        assert_eq!(order.sub_order_ids(), vec![SubOrderId(1), SubOrderId(2)]);
    }
}
