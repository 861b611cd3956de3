//! Database operations for DineEase `PostgreSQL`.
//!
//! ## Tables
//!
//! - `restaurants` - Catalog entries
//! - `menu_items` - Dishes (soft-deleted through `archived_at`)
//! - `coupons` - Percentage-off codes
//! - `orders` - Orders with stored totals and the attached coupon
//! - `order_items` - Line items with the unit price captured at order time
//! - `reviews` - At most one per order
//! - `customer_ratings` - Webcam emotion ratings (JSONB scores)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/ordering/migrations/` and run via:
//! ```bash
//! cargo run -p dineease-cli -- migrate
//! ```

pub mod coupons;
pub mod orders;
pub mod ratings;
pub mod restaurants;
pub mod reviews;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use secrecy::ExposeSecret;

use crate::config::DatabaseConfig;

pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use ratings::CustomerRatingRepository;
pub use restaurants::RestaurantRepository;
pub use reviews::ReviewRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate coupon code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`],
    /// passing every other error through.
    pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(message.into()),
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.url.expose_secret())
        .await
}

/// Convert a stored quantity or count back into the domain's `u32`.
pub(crate) fn to_u32(value: i32, what: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative {what} in database: {value}"))
    })
}

/// Convert a stored `COUNT` or `SUM` back into a `u64`.
pub(crate) fn to_u64(value: i64, what: &str) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative {what} in database: {value}"))
    })
}
