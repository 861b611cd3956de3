//! CLI subcommands.
//!
//! Every command loads [`OrderingConfig`] from the environment and opens its
//! own connection pool.

pub mod coupon;
pub mod migrate;
pub mod order;
pub mod rate;
pub mod report;
pub mod seed;

use dineease_ordering::db;
use dineease_ordering::{OrderingConfig, RequestContext};
use sqlx::PgPool;

/// Load configuration and connect to the database.
///
/// # Errors
///
/// Returns an error if configuration is missing or the database is
/// unreachable.
pub async fn connect() -> Result<(OrderingConfig, PgPool), Box<dyn std::error::Error>> {
    let config = OrderingConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database).await?;
    Ok((config, pool))
}

/// Context for operator actions run from the command line.
#[must_use]
pub fn operator_context() -> RequestContext {
    RequestContext::from_session(None)
}
