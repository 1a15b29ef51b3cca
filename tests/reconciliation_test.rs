use async_trait::async_trait;
use chrono::Utc;
use order_sync::api::StatusUpdate;
use order_sync::bus::EventBus;
use order_sync::config::Config;
use order_sync::lifecycle::OrderSystem;
use order_sync::model::{
    BusEvent, Customer, LineItem, Order, OrderCreate, OrderEvent, OrderEventKind, OrderId,
    OrderStatus, OrderSummary, PaymentMethod, RestaurantId, Snapshot, SubOrder, SubOrderCreate,
    SubOrderId, SubOrderStatus,
};
use order_sync::poller::{SnapshotSource, SourceError};
use order_sync::session::DashboardSession;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A source whose answer the test can change.
struct SwitchableSource {
    snapshot: Mutex<Snapshot>,
}

impl SwitchableSource {
    fn empty() -> Self {
        Self {
            snapshot: Mutex::new(Snapshot {
                orders: vec![],
                unread_count: 0,
                notification_revision: 0,
                taken_at: Utc::now(),
            }),
        }
    }

    fn serve(&self, orders: Vec<Order>) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.orders = orders.into_iter().map(OrderSummary::from).collect();
        snapshot.taken_at = Utc::now();
    }
}

#[async_trait]
impl SnapshotSource for SwitchableSource {
    async fn fetch(&self) -> Result<Snapshot, SourceError> {
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

fn changed(sub: u32, old: SubOrderStatus, new: SubOrderStatus, sequence: u64) -> BusEvent {
    BusEvent::Order(OrderEvent {
        kind: OrderEventKind::SubOrderStatusChanged,
        order_id: OrderId(1),
        sub_order_id: Some(SubOrderId(sub)),
        restaurant_id: Some(RestaurantId::new("r1")),
        old_status: Some(old),
        new_status: Some(new),
        order_status: None,
        sub_order_ids: vec![],
        sequence,
        occurred_at: Utc::now(),
    })
}

fn order_at(status: SubOrderStatus, sequence: u64) -> Order {
    Order {
        id: OrderId(1),
        customer: Customer::new("Cara", "555-0102"),
        payment_method: PaymentMethod::Card,
        delivery_address: None,
        ordered_at: Utc::now(),
        sub_orders: vec![SubOrder {
            id: SubOrderId(1),
            order_id: OrderId(1),
            restaurant_id: RestaurantId::new("r1"),
            items: vec![],
            status,
        }],
        sequence,
    }
}

/// Events 0, 1, 3 arrive; 2 was lost. The entry goes stale, the gap triggers an immediate
/// poll and the snapshot heals it long before the regular 30s interval.
#[tokio::test]
async fn test_sequence_gap_is_healed_by_triggered_poll() {
    let bus = EventBus::new(8);
    let source = Arc::new(SwitchableSource::empty());
    let mut session = DashboardSession::open(1, &bus, source.clone(), &Config::default());

    bus.publish(BusEvent::Order(OrderEvent::new_order(
        OrderId(1),
        vec![SubOrderId(1)],
        Utc::now(),
    )));
    bus.publish(changed(1, SubOrderStatus::Pending, SubOrderStatus::Confirmed, 1));
    let view = tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|v| v.order(OrderId(1)).is_some_and(|e| e.sequence == 1)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(view.order(OrderId(1)).unwrap().status, OrderStatus::Confirmed);

    source.serve(vec![order_at(SubOrderStatus::Ready, 3)]);
    bus.publish(changed(1, SubOrderStatus::Preparing, SubOrderStatus::Ready, 3));

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|v| {
            v.order(OrderId(1))
                .is_some_and(|e| e.sequence == 3 && !e.stale)
        }),
    )
    .await
    .expect("gap was not healed")
    .unwrap();
    let entry = view.order(OrderId(1)).unwrap();
    assert_eq!(entry.status, OrderStatus::Ready);
    assert_eq!(entry.sub_orders[&SubOrderId(1)], SubOrderStatus::Ready);
    assert!(!view.has_stale());

    // Replayed events are duplicates now.
    bus.publish(changed(1, SubOrderStatus::Preparing, SubOrderStatus::Ready, 3));
    session.close().await;
}

/// A dashboard opened after the order was placed still converges on the stored state,
/// whether the first snapshot or the next event reaches it first.
#[tokio::test]
async fn test_late_session_converges_on_live_system() {
    let system = OrderSystem::new(Config::default()).unwrap();
    let api = system.api().clone();

    let order = api
        .place_order(
            "owner-1",
            OrderCreate {
                customer: Customer::new("Dan", "555-0103"),
                payment_method: PaymentMethod::Cash,
                delivery_address: None,
                sub_orders: vec![SubOrderCreate {
                    restaurant_id: RestaurantId::new("r9"),
                    items: vec![LineItem::new("f3", "Laksa", 1, Decimal::new(1100, 2))],
                }],
            },
        )
        .await
        .unwrap();
    let sub = order.sub_orders[0].id;
    let update = |status| StatusUpdate {
        status,
        expected_status: None,
    };
    api.update_sub_order_status("owner-1", order.id, sub, update(SubOrderStatus::Confirmed))
        .await
        .unwrap();

    let mut session = system.open_session();
    api.update_sub_order_status("owner-1", order.id, sub, update(SubOrderStatus::Preparing))
        .await
        .unwrap();

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|v| {
            v.order(order.id)
                .is_some_and(|e| e.sequence == 2 && !e.stale)
        }),
    )
    .await
    .expect("late session did not converge")
    .unwrap();
    assert_eq!(view.order(order.id).unwrap().status, OrderStatus::Preparing);

    session.close().await;
    drop(api);
    system.shutdown().await.unwrap();
}
