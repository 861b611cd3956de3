//! Coupons and the percentage-discount engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dineease_core::{CouponCode, CouponId, OrderStatus, Price};

use super::order::Order;

/// Default discount for new coupons.
pub const DEFAULT_DISCOUNT_PERCENTAGE: u8 = 10;

/// Errors raised while creating or applying coupons.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponError {
    /// No coupon has this code.
    #[error("coupon {0} was not found")]
    NotFound(CouponCode),

    /// The coupon is switched off or outside its validity window.
    #[error("coupon {0} is inactive or expired")]
    NotValid(CouponCode),

    /// The order already carries a discount.
    #[error("a coupon has already been applied to this order")]
    AlreadyApplied,

    /// The percentage rounds to no discount at all on this order.
    #[error("coupon {0} gives no discount on this order")]
    NoDiscount(CouponCode),

    /// Discounts can only be taken on orders still pending.
    #[error("coupons can only be applied to pending orders (order is {})", .0.label())]
    OrderNotPending(OrderStatus),

    /// Percentage outside 1..=100.
    #[error("discount percentage must be between 1 and 100, got {0}")]
    InvalidPercentage(i64),

    /// `valid_from` is after `valid_to`.
    #[error("coupon validity window ends before it starts")]
    InvalidWindow,
}

/// A percentage-off coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique coupon ID.
    pub id: CouponId,
    /// Unique, upper-cased code customers type in.
    pub code: CouponCode,
    /// Percentage taken off the order subtotal (1-100).
    pub discount_percentage: u8,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub valid_to: DateTime<Utc>,
    /// Owner-controlled kill switch.
    pub is_active: bool,
    /// When the coupon was created.
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Active and `now` within `[valid_from, valid_to]`.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_to
    }
}

/// A validated coupon ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    /// Code (generated when none was given).
    pub code: CouponCode,
    /// Percentage off (1-100).
    pub discount_percentage: u8,
    /// Start of the validity window.
    pub valid_from: DateTime<Utc>,
    /// End of the validity window.
    pub valid_to: DateTime<Utc>,
    /// Whether the coupon starts active.
    pub is_active: bool,
}

impl NewCoupon {
    /// Validate coupon settings, generating a code if none was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::InvalidPercentage`] for a percentage outside
    /// 1..=100 and [`CouponError::InvalidWindow`] when the window is inverted.
    pub fn new(
        code: Option<CouponCode>,
        discount_percentage: i64,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        is_active: bool,
    ) -> Result<Self, CouponError> {
        let discount_percentage = match u8::try_from(discount_percentage) {
            Ok(p @ 1..=100) => p,
            _ => return Err(CouponError::InvalidPercentage(discount_percentage)),
        };
        if valid_from > valid_to {
            return Err(CouponError::InvalidWindow);
        }
        Ok(Self {
            code: code.unwrap_or_else(CouponCode::generate),
            discount_percentage,
            valid_from,
            valid_to,
            is_active,
        })
    }
}

/// Apply `coupon` to `order`, returning the discount taken.
///
/// The discount is computed from the order subtotal, never from the current
/// total, and an order can carry at most one coupon; a second application is
/// rejected instead of discounting again.
///
/// # Errors
///
/// - [`CouponError::AlreadyApplied`] if the order already has a coupon
/// - [`CouponError::OrderNotPending`] unless the order is pending
/// - [`CouponError::NotValid`] if the coupon is inactive or outside its window
/// - [`CouponError::NoDiscount`] if the discount rounds to zero, so the
///   coupon is not used up on a discount of nothing
///
/// The order is left untouched on error.
pub fn apply_coupon(
    order: &mut Order,
    coupon: &Coupon,
    now: DateTime<Utc>,
) -> Result<Price, CouponError> {
    if order.coupon_id.is_some() || !order.discount_applied.is_zero() {
        return Err(CouponError::AlreadyApplied);
    }
    if order.status != OrderStatus::Pending {
        return Err(CouponError::OrderNotPending(order.status));
    }
    if !coupon.is_valid(now) {
        return Err(CouponError::NotValid(coupon.code.clone()));
    }

    let discount = order.subtotal().percentage(coupon.discount_percentage);
    if discount.is_zero() {
        return Err(CouponError::NoDiscount(coupon.code.clone()));
    }
    order.discount_applied = discount;
    order.coupon_id = Some(coupon.id);
    order.recompute_total();
    Ok(discount)
}
