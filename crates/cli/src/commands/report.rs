//! Owner dashboard command.

use dineease_core::RestaurantId;
use dineease_ordering::services::ReportingService;

/// Log (or print as JSON) the dashboard of a restaurant.
///
/// # Errors
///
/// Returns an error if the restaurant does not exist or the database is
/// unreachable.
pub async fn run(
    restaurant_id: RestaurantId,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = super::connect().await?;
    let ctx = super::operator_context();

    let dashboard = ReportingService::new(&pool, config.top_items)
        .dashboard(&ctx, restaurant_id)
        .await?;

    if json {
        #[allow(clippy::print_stdout)]
        {
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        return Ok(());
    }

    let report = &dashboard.report;
    tracing::info!("{} - {}", config.site_name, dashboard.restaurant.name);
    tracing::info!("========================");
    tracing::info!("Total orders: {}", report.total_orders);
    for count in &report.status_counts {
        tracing::info!("  {}: {}", count.status.label(), count.count);
    }
    tracing::info!("Revenue (completed): {}", report.revenue);
    match report.average_rating {
        Some(average) => tracing::info!(
            "Average rating: {average} from {} reviews",
            report.review_count
        ),
        None => tracing::info!("Average rating: no reviews yet"),
    }
    tracing::info!("Top items:");
    for item in &report.top_items {
        tracing::info!(
            "  {} - {} orders, {} sold",
            item.name,
            item.order_count,
            item.quantity
        );
    }
    tracing::info!("This month:");
    for day in report.daily.iter().filter(|d| d.orders > 0) {
        tracing::info!("  {}: {} orders, {}", day.date, day.orders, day.revenue);
    }
    Ok(())
}
