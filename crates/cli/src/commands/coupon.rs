//! Coupon management commands.
//!
//! # Usage
//!
//! ```bash
//! # 10% off for 30 days with a generated code
//! dineease coupon create
//!
//! # Named coupon, created switched off
//! dineease coupon create -c SPRING -p 15 -d 14 --inactive
//! ```

use chrono::Duration;

use dineease_core::CouponCode;
use dineease_ordering::models::NewCoupon;
use dineease_ordering::services::CouponService;

/// Create a coupon valid from now for `days` days.
///
/// # Errors
///
/// Returns an error if the code or percentage is invalid, the code is taken,
/// or the database is unreachable.
pub async fn create(
    code: Option<&str>,
    percentage: i64,
    days: i64,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = code.map(CouponCode::parse).transpose()?;
    let ctx = super::operator_context();
    let coupon = NewCoupon::new(
        code,
        percentage,
        ctx.now,
        ctx.now + Duration::days(days),
        active,
    )?;

    let (_, pool) = super::connect().await?;
    let coupon = CouponService::new(&pool).create(&ctx, &coupon).await?;

    tracing::info!(
        code = %coupon.code,
        percentage = coupon.discount_percentage,
        valid_to = %coupon.valid_to,
        active = coupon.is_active,
        "Coupon created"
    );
    Ok(())
}
