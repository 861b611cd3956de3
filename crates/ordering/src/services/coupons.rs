//! Coupon service.

use sqlx::PgPool;
use tracing::{Instrument, instrument};

use dineease_core::{CouponCode, CouponId, OrderId};

use crate::context::RequestContext;
use crate::db::{CouponRepository, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::coupon::{Coupon, CouponError, NewCoupon, apply_coupon};
use crate::models::order::Order;
use crate::services::orders::owned_by;

/// Coupon service.
pub struct CouponService<'a> {
    pool: &'a PgPool,
    coupons: CouponRepository<'a>,
}

impl<'a> CouponService<'a> {
    /// Create a new coupon service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            coupons: CouponRepository::new(pool),
        }
    }

    /// Store a new coupon.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` repository error if the code is taken.
    #[instrument(skip(self, ctx, coupon), fields(code = %coupon.code))]
    pub async fn create(&self, ctx: &RequestContext, coupon: &NewCoupon) -> Result<Coupon> {
        async {
            let coupon = self.coupons.create(coupon).await?;
            tracing::info!(
                coupon_id = %coupon.id,
                percentage = coupon.discount_percentage,
                "Created coupon"
            );
            Ok(coupon)
        }
        .instrument(ctx.span("create_coupon"))
        .await
    }

    /// Every coupon, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>> {
        Ok(self.coupons.list().await?)
    }

    /// Switch a coupon on or off.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the coupon does not exist.
    #[instrument(skip(self, ctx), fields(coupon_id = %id))]
    pub async fn set_active(&self, ctx: &RequestContext, id: CouponId, active: bool) -> Result<()> {
        self.coupons
            .set_active(id, active)
            .instrument(ctx.span("set_coupon_active"))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound("Coupon".to_string()),
                other => AppError::Repository(other),
            })
    }

    /// Apply `code` to one of the context customer's pending orders.
    ///
    /// The order row is locked for the duration, so two concurrent requests
    /// cannot both discount it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order is not the customer's, and
    /// `AppError::Coupon` if the code is unknown, invalid, or the order
    /// already carries a coupon. The order is unchanged on error.
    #[instrument(skip(self, ctx), fields(order_id = %order_id, code = %code))]
    pub async fn apply(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        code: &CouponCode,
    ) -> Result<Order> {
        async {
            let mut tx = self.pool.begin().await?;
            let order = OrderRepository::lock(&mut *tx, order_id).await?;
            let mut order = owned_by(order, &ctx.customer)?;

            let coupon = CouponRepository::find_by_code(&mut *tx, code)
                .await?
                .ok_or_else(|| CouponError::NotFound(code.clone()))?;
            let discount = apply_coupon(&mut order, &coupon, ctx.now)?;
            OrderRepository::save_pricing(&mut *tx, &order).await?;
            tx.commit().await?;

            tracing::info!(%discount, total = %order.total_price, "Applied coupon");
            Ok(order)
        }
        .instrument(ctx.span("apply_coupon"))
        .await
    }
}
