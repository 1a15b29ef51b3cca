//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden; records carry structured ids instead
//! (`order_id`, `sub_order_id`, `session`, `sequence`).
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=order_sync::session=debug cargo run
//! ```
//!
//! At `info` a status change reads roughly:
//!
//! ```text
//! INFO order_flow:update_sub_order_status: Status updated order_id=order_1 sub_order_id=sub_2 status=confirmed sequence=2
//! ```
//!
//! `debug` adds full payloads at actor entry points and every sequence gap a session sees.

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
