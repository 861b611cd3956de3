//! Core types for DineEase.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coupon_code;
pub mod customer;
pub mod id;
pub mod price;
pub mod rating;
pub mod status;

pub use coupon_code::{CouponCode, CouponCodeError};
pub use customer::{Customer, GuestId};
pub use id::*;
pub use price::{Price, PriceError};
pub use rating::{Rating, RatingError};
pub use status::*;
