//! # Status Transitions
//!
//! The sub-order state machine and the rule that derives an order's status from its
//! sub-orders. Everything here is pure: nothing is persisted or published, the
//! [order actor](crate::order_actor) does that after a transition is accepted.
//!
//! ```text
//! pending -> confirmed -> preparing -> ready -> on_the_way -> delivered
//!    |           |
//!    +-----------+--> cancelled
//! ```

use crate::model::{OrderEvent, OrderEventKind, OrderStatus, SubOrder, SubOrderStatus};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot move from {current} to {target}")]
    InvalidTransition {
        current: SubOrderStatus,
        target: SubOrderStatus,
    },
}

/// Edge membership in the status graph.
pub fn can_transition(from: SubOrderStatus, to: SubOrderStatus) -> bool {
    use SubOrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, OnTheWay)
            | (OnTheWay, Delivered)
            | (Pending, Cancelled)
            | (Confirmed, Cancelled)
    )
}

/// The statuses `from` may move to next. Empty for terminal statuses.
pub fn allowed_targets(from: SubOrderStatus) -> Vec<SubOrderStatus> {
    SubOrderStatus::ALL
        .into_iter()
        .filter(|to| can_transition(from, *to))
        .collect()
}

/// Validates a status change and returns the updated sub-order plus the event describing it.
///
/// The event is stamped with `sequence` and kind `sub_order_status_changed`; the caller owns
/// the order-level view and upgrades the kind when the change resolves the whole order.
pub fn transition(
    sub_order: &SubOrder,
    target: SubOrderStatus,
    sequence: u64,
) -> Result<(SubOrder, OrderEvent), TransitionError> {
    let current = sub_order.status;
    if !can_transition(current, target) {
        return Err(TransitionError::InvalidTransition { current, target });
    }

    let mut updated = sub_order.clone();
    updated.status = target;

    let event = OrderEvent {
        kind: OrderEventKind::SubOrderStatusChanged,
        order_id: sub_order.order_id,
        sub_order_id: Some(sub_order.id),
        restaurant_id: Some(sub_order.restaurant_id.clone()),
        old_status: Some(current),
        new_status: Some(target),
        order_status: None,
        sub_order_ids: Vec::new(),
        sequence,
        occurred_at: Utc::now(),
    };
    Ok((updated, event))
}

/// Customer-facing status of an order with the given sub-order statuses.
///
/// - every sub-order delivered: `delivered`
/// - every sub-order cancelled: `cancelled`
/// - every sub-order terminal, mixed: `partially_fulfilled`
/// - otherwise the least advanced non-terminal status
///
/// Depends only on the multiset of statuses. An empty input yields `pending`.
pub fn derive_order_status<I>(statuses: I) -> OrderStatus
where
    I: IntoIterator<Item = SubOrderStatus>,
{
    let mut delivered = 0usize;
    let mut cancelled = 0usize;
    let mut least_advanced: Option<SubOrderStatus> = None;

    for status in statuses {
        match status {
            SubOrderStatus::Delivered => delivered += 1,
            SubOrderStatus::Cancelled => cancelled += 1,
            open => {
                least_advanced = match least_advanced {
                    Some(current) if current.progress() <= open.progress() => Some(current),
                    _ => Some(open),
                };
            }
        }
    }

    match (least_advanced, delivered, cancelled) {
        (Some(open), _, _) => open.into(),
        (None, 0, 0) => OrderStatus::Pending,
        (None, _, 0) => OrderStatus::Delivered,
        (None, 0, _) => OrderStatus::Cancelled,
        (None, _, _) => OrderStatus::PartiallyFulfilled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderId, RestaurantId, SubOrderId};
    use SubOrderStatus::*;

    fn sub_order(status: SubOrderStatus) -> SubOrder {
        SubOrder {
            id: SubOrderId(11),
            order_id: OrderId(3),
            restaurant_id: RestaurantId::new("sushi-bar"),
            items: vec![],
            status,
        }
    }

    #[test]
    fn test_transition_table_is_exhaustive() {
        let edges = [
            (Pending, Confirmed),
            (Confirmed, Preparing),
            (Preparing, Ready),
            (Ready, OnTheWay),
            (OnTheWay, Delivered),
            (Pending, Cancelled),
            (Confirmed, Cancelled),
        ];

        for from in SubOrderStatus::ALL {
            for to in SubOrderStatus::ALL {
                let expected = edges.contains(&(from, to));
                assert_eq!(can_transition(from, to), expected, "{} -> {}", from, to);

                let result = transition(&sub_order(from), to, 1);
                assert_eq!(result.is_ok(), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_targets() {
        assert!(allowed_targets(Delivered).is_empty());
        assert!(allowed_targets(Cancelled).is_empty());
        assert_eq!(allowed_targets(Pending), vec![Confirmed, Cancelled]);
        assert_eq!(allowed_targets(Ready), vec![OnTheWay]);
    }

    #[test]
    fn test_ready_cannot_be_cancelled() {
        let err = transition(&sub_order(Ready), Cancelled, 4).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                current: Ready,
                target: Cancelled
            }
        );
        assert_eq!(err.to_string(), "Cannot move from ready to cancelled");
    }

    #[test]
    fn test_transition_builds_event_without_touching_input() {
        let original = sub_order(Confirmed);
        let (updated, event) = transition(&original, Preparing, 2).unwrap();

        assert_eq!(original.status, Confirmed);
        assert_eq!(updated.status, Preparing);
        assert_eq!(event.kind, OrderEventKind::SubOrderStatusChanged);
        assert_eq!(event.order_id, OrderId(3));
        assert_eq!(event.sub_order_id, Some(SubOrderId(11)));
        assert_eq!(event.old_status, Some(Confirmed));
        assert_eq!(event.new_status, Some(Preparing));
        assert_eq!(event.sequence, 2);
    }

    #[test]
    fn test_derive_status_rules() {
        assert_eq!(derive_order_status([Delivered, Preparing]), OrderStatus::Preparing);
        assert_eq!(derive_order_status([Delivered, Delivered]), OrderStatus::Delivered);
        assert_eq!(derive_order_status([Cancelled, Cancelled]), OrderStatus::Cancelled);
        assert_eq!(
            derive_order_status([Delivered, Cancelled]),
            OrderStatus::PartiallyFulfilled
        );
        assert_eq!(
            derive_order_status([OnTheWay, Confirmed, Cancelled]),
            OrderStatus::Confirmed
        );
        assert_eq!(derive_order_status(Vec::new()), OrderStatus::Pending);
    }

    fn permutations(items: &[SubOrderStatus]) -> Vec<Vec<SubOrderStatus>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_derive_status_ignores_order() {
        let samples: [&[SubOrderStatus]; 4] = [
            &[Delivered, Preparing, Cancelled, Ready],
            &[Pending, OnTheWay, Delivered],
            &[Cancelled, Delivered, Cancelled],
            &[Confirmed, Confirmed, Ready, Delivered],
        ];

        for sample in samples {
            let expected = derive_order_status(sample.iter().copied());
            for permutation in permutations(sample) {
                assert_eq!(derive_order_status(permutation), expected);
            }
        }
    }
}
