//! Order management commands.

use dineease_core::{OrderId, OrderStatus};
use dineease_ordering::services::OrderService;

/// Move order `id` to `status`.
///
/// # Errors
///
/// Returns an error if the order does not exist, the transition is not
/// allowed, or the database is unreachable.
pub async fn set_status(id: i32, status: OrderStatus) -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;
    let ctx = super::operator_context();

    let order = OrderService::new(&pool)
        .transition_status(&ctx, OrderId::new(id), status)
        .await?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        total = %order.total_price,
        "Order updated"
    );
    Ok(())
}
