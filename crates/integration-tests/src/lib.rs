//! Integration tests for DineEase.
//!
//! # Running Tests
//!
//! ```bash
//! # Scenario tests (no database needed)
//! cargo test -p dineease-integration-tests
//!
//! # Including the database round trips
//! DATABASE_URL=postgres://localhost/dineease_test \
//!     cargo test -p dineease-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `order_flow` - Ordering, coupons and reviews across the domain model
//! - `dashboard` - Owner reporting over a month of orders
//! - `emotion` - Frame decoding and rating
//! - `database` - Service calls against a live `PostgreSQL`
//!
//! This crate holds the fixtures those tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Duration, Utc};

use dineease_core::{
    CouponCode, CouponId, MenuItemId, OrderId, OrderItemId, OrderStatus, Price, RestaurantId,
};
use dineease_ordering::models::{Coupon, MenuItem, NewOrder, Order, OrderItem};

/// A menu item of `restaurant` priced in cents.
#[must_use]
pub fn menu_item(id: i32, restaurant: RestaurantId, name: &str, cents: i64) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        restaurant_id: restaurant,
        name: name.to_string(),
        price: Price::from_cents(cents),
        description: String::new(),
        image: None,
        archived_at: None,
    }
}

/// What the order repository returns after inserting `new`.
#[must_use]
pub fn persist(new: NewOrder, id: i32) -> Order {
    let items = new
        .lines
        .into_iter()
        .zip(1..)
        .map(|(line, n)| OrderItem {
            id: OrderItemId::new(id * 100 + n),
            menu_item_id: line.menu_item_id,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();

    Order {
        id: OrderId::new(id),
        restaurant_id: new.restaurant_id,
        customer: new.customer,
        status: OrderStatus::Pending,
        items,
        total_price: new.total_price,
        discount_applied: Price::ZERO,
        coupon_id: None,
        reviewed: false,
        created_at: new.created_at,
    }
}

/// An active coupon valid for a week either side of `now`.
///
/// # Panics
///
/// Panics if `code` is not a valid coupon code.
#[must_use]
pub fn coupon(id: i32, code: &str, percentage: u8, now: DateTime<Utc>) -> Coupon {
    #[allow(clippy::unwrap_used)]
    let code = CouponCode::parse(code).unwrap();
    Coupon {
        id: CouponId::new(id),
        code,
        discount_percentage: percentage,
        valid_from: now - Duration::days(7),
        valid_to: now + Duration::days(7),
        is_active: true,
        created_at: now - Duration::days(7),
    }
}
