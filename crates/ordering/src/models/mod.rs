//! Domain models for restaurant ordering.
//!
//! Models hold data and the pure rules that govern it (order totals, status
//! transitions, coupon application, review eligibility). Persistence lives in
//! [`crate::db`] and orchestration in [`crate::services`].

pub mod coupon;
pub mod customer_rating;
pub mod order;
pub mod report;
pub mod restaurant;
pub mod review;

pub use coupon::{Coupon, CouponError, DEFAULT_DISCOUNT_PERCENTAGE, NewCoupon, apply_coupon};
pub use customer_rating::{CustomerRating, Emotion, EmotionScores, NewCustomerRating};
pub use order::{
    MAX_LINE_QUANTITY, NewOrder, Order, OrderBuilder, OrderError, OrderItem, OrderLine,
};
pub use report::{DailyTotals, OrderTotals, RatingSummary, StatusCount, TopItem};
pub use restaurant::{
    MenuItem, MenuItemInput, Restaurant, RestaurantFilter, RestaurantInput, RestaurantWithMenu,
};
pub use review::{MAX_REVIEW_LENGTH, MIN_REVIEW_LENGTH, NewReview, Review, ReviewError};
