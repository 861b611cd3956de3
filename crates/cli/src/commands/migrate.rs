//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dineease migrate
//! ```
//!
//! Migrations live in `crates/ordering/migrations/` and are embedded into the
//! binary at build time.

use dineease_ordering::db::MIGRATOR;

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;

    tracing::info!(
        available = MIGRATOR.iter().count(),
        "Running migrations..."
    );
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
