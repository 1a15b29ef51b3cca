//! # Order Queries
//!
//! Filtering, sorting and pagination over order snapshots for the dashboard list.
//! Pure functions: callers fetch the orders from the [`OrderStore`](crate::store::OrderStore)
//! and pass them in.

use crate::model::{Order, OrderStatus, OrderSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters of `GET /orders`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderQuery {
    /// Matches the derived order status.
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring of the customer name or the order id.
    pub search: Option<String>,
    /// Inclusive, compared against the UTC date of `ordered_at`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive, compared against the UTC date of `ordered_at`.
    pub date_to: Option<NaiveDate>,
    /// 1-based. `0` is treated as `1`.
    pub page: Option<u32>,
    /// Defaults to 20, capped at 100.
    pub page_size: Option<u32>,
}

impl OrderQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        match self.page_size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        }
    }

    fn matches(&self, order: &Order, status: OrderStatus, needle: Option<&str>) -> bool {
        if self.status.is_some_and(|wanted| wanted != status) {
            return false;
        }

        let day = order.ordered_at.date_naive();
        if self.date_from.is_some_and(|from| day < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| day > to) {
            return false;
        }

        match needle {
            Some(needle) => {
                order.customer.name.to_lowercase().contains(needle)
                    || order.id.to_string().contains(needle)
            }
            None => true,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches across all pages.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size as usize)
    }
}

/// Filters, sorts newest-first (ties by id, highest first) and cuts out the requested page.
pub fn query_orders(orders: Vec<Order>, query: &OrderQuery) -> Page<OrderSummary> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<OrderSummary> = orders
        .into_iter()
        .map(OrderSummary::from)
        .filter(|summary| query.matches(&summary.order, summary.status, needle.as_deref()))
        .collect();
    matching.sort_by(|a, b| {
        b.order
            .ordered_at
            .cmp(&a.order.ordered_at)
            .then_with(|| b.order.id.cmp(&a.order.id))
    });

    let page = query.page();
    let page_size = query.page_size();
    let total = matching.len();
    let skip = (page as usize - 1).saturating_mul(page_size as usize);
    let items = matching
        .into_iter()
        .skip(skip)
        .take(page_size as usize)
        .collect();

    Page {
        items,
        total,
        page,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Customer, OrderId, PaymentMethod, RestaurantId, SubOrder, SubOrderId, SubOrderStatus,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn order(id: u32, name: &str, at: DateTime<Utc>, status: SubOrderStatus) -> Order {
        Order {
            id: OrderId(id),
            customer: Customer::new(name, "555-0000"),
            payment_method: PaymentMethod::Card,
            delivery_address: None,
            ordered_at: at,
            sub_orders: vec![SubOrder {
                id: SubOrderId(id),
                order_id: OrderId(id),
                restaurant_id: RestaurantId::new("r"),
                items: vec![],
                status,
            }],
            sequence: 0,
        }
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn sample() -> Vec<Order> {
        vec![
            order(1, "Alice Wong", day(1, 9), SubOrderStatus::Pending),
            order(2, "Bob Stone", day(2, 9), SubOrderStatus::Delivered),
            order(3, "alicia keys", day(2, 9), SubOrderStatus::Pending),
            order(4, "Dan", day(3, 23), SubOrderStatus::Preparing),
            order(5, "Eve", day(4, 0), SubOrderStatus::Cancelled),
        ]
    }

    fn ids(page: &Page<OrderSummary>) -> Vec<u32> {
        page.items.iter().map(|s| s.order.id.0).collect()
    }

    #[test]
    fn test_newest_first_with_id_tiebreak() {
        let page = query_orders(sample(), &OrderQuery::default());
        assert_eq!(ids(&page), vec![5, 4, 3, 2, 1]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_filters() {
        let pending = OrderQuery {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        assert_eq!(ids(&query_orders(sample(), &pending)), vec![3, 1]);

        let search = OrderQuery {
            search: Some("  ALIC ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query_orders(sample(), &search)), vec![3, 1]);

        let by_id = OrderQuery {
            search: Some("order_4".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&query_orders(sample(), &by_id)), vec![4]);

        let range = OrderQuery {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 2),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 3),
            ..Default::default()
        };
        assert_eq!(ids(&query_orders(sample(), &range)), vec![4, 3, 2]);
    }

    #[test]
    fn test_pages_concatenate_to_full_result() {
        let full = query_orders(sample(), &OrderQuery::default());

        for page_size in 1..=6 {
            let first = query_orders(
                sample(),
                &OrderQuery {
                    page_size: Some(page_size),
                    ..Default::default()
                },
            );
            let mut collected = Vec::new();
            for page in 1..=first.total_pages() as u32 {
                let query = OrderQuery {
                    page: Some(page),
                    page_size: Some(page_size),
                    ..Default::default()
                };
                collected.extend(ids(&query_orders(sample(), &query)));
            }
            assert_eq!(collected, ids(&full), "page_size {}", page_size);
        }
    }

    #[test]
    fn test_page_bounds() {
        let past_end = OrderQuery {
            page: Some(9),
            page_size: Some(2),
            ..Default::default()
        };
        let page = query_orders(sample(), &past_end);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);

        let oversized = OrderQuery {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(oversized.page(), 1);
        assert_eq!(oversized.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_query_deserializes_from_camel_case() {
        let query: OrderQuery = serde_json::from_str(
            r#"{"status":"on_the_way","dateFrom":"2024-03-01","pageSize":5}"#,
        )
        .unwrap();
        assert_eq!(query.status, Some(OrderStatus::OnTheWay));
        assert_eq!(query.date_from, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(query.page_size(), 5);
    }
}
