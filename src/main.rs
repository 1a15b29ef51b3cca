//! Demo: one checkout across two restaurants, followed live by an owner dashboard.
//!
//! Set `ORDER_SYNC_CONFIG` to a TOML file to override the defaults.

use order_sync::api::StatusUpdate;
use order_sync::config::Config;
use order_sync::lifecycle::{setup_tracing, OrderSystem};
use order_sync::model::{
    Customer, LineItem, NotificationFilter, OrderCreate, PaymentMethod, RestaurantId,
    SubOrderCreate, SubOrderStatus,
};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, Instrument};

const OWNER: &str = "owner-1";

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = match std::env::var("ORDER_SYNC_CONFIG") {
        Ok(path) => Config::load(path),
        Err(_) => Config::from_env(),
    }
    .map_err(|e| e.to_string())?;

    let system = OrderSystem::new(config).map_err(|e| e.to_string())?;
    let api = system.api().clone();
    let mut session = system.open_session();

    let checkout = OrderCreate {
        customer: Customer::new("Alice", "+1-555-0100"),
        payment_method: PaymentMethod::Card,
        delivery_address: Some("12 Harbour Road".to_string()),
        sub_orders: vec![
            SubOrderCreate {
                restaurant_id: RestaurantId::new("noodle-bar"),
                items: vec![LineItem::new("f-1", "Dan dan noodles", 2, Decimal::new(950, 2))],
            },
            SubOrderCreate {
                restaurant_id: RestaurantId::new("taco-stand"),
                items: vec![LineItem::new("f-7", "Fish taco", 3, Decimal::new(400, 2))],
            },
        ],
    };

    let span = tracing::info_span!("checkout");
    let order = async {
        info!("Placing order");
        api.place_order(OWNER, checkout).await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;
    info!(order_id = %order.id, total = %order.total(), "Order placed");

    let span = tracing::info_span!("order_flow");
    async {
        let noodles = order.sub_orders[0].id;
        let tacos = order.sub_orders[1].id;
        let steps = [
            (noodles, SubOrderStatus::Confirmed),
            (tacos, SubOrderStatus::Cancelled),
            (noodles, SubOrderStatus::Preparing),
            (noodles, SubOrderStatus::Ready),
            (noodles, SubOrderStatus::OnTheWay),
            (noodles, SubOrderStatus::Delivered),
            // Rejected: delivered is terminal.
            (noodles, SubOrderStatus::Cancelled),
        ];
        for (sub_order_id, status) in steps {
            let update = StatusUpdate {
                status,
                expected_status: None,
            };
            if let Err(e) = api
                .update_sub_order_status(OWNER, order.id, sub_order_id, update)
                .await
            {
                error!(code = ?e.code(), http_status = e.http_status(), error = %e, "Update rejected");
            }
        }
    }
    .instrument(span)
    .await;

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|v| {
            v.order(order.id).is_some_and(|entry| entry.status.is_resolved()) && v.unread_count() >= 7
        }),
    )
    .await
    .map_err(|_| "dashboard did not catch up".to_string())?
    .ok_or_else(|| "dashboard session stopped".to_string())?;

    for toast in view.toasts() {
        info!(title = %toast.title, message = %toast.message, "Toast");
    }
    info!(
        unread = view.unread_count(),
        badge = view.badge(),
        health = ?view.health(),
        "Dashboard"
    );

    let unread = api
        .list_notifications(NotificationFilter {
            unread_only: true,
            ..NotificationFilter::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(count = unread.len(), "Unread notifications");
    let marked = api
        .mark_all_notifications_read(OWNER)
        .await
        .map_err(|e| e.to_string())?;
    info!(marked, "Marked all read");

    let snapshot = system.snapshot().await.map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
    println!("{}", json);

    session.close().await;
    drop(api);
    system.shutdown().await?;
    Ok(())
}
