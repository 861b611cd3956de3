//! Customer reviews of completed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dineease_core::{Customer, OrderId, OrderStatus, Rating, RestaurantId, ReviewId, UserId};

use super::order::Order;

/// Minimum review body length, in characters, after trimming.
pub const MIN_REVIEW_LENGTH: usize = 10;

/// Maximum review body length, in characters.
pub const MAX_REVIEW_LENGTH: usize = 2000;

/// Errors raised when submitting a review.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Only completed orders can be reviewed.
    #[error("only completed orders can be reviewed (order is {})", .0.label())]
    OrderNotCompleted(OrderStatus),

    /// The order already has its review.
    #[error("this order has already been reviewed")]
    AlreadyReviewed,

    /// The requester did not place the order.
    #[error("you can only review your own orders")]
    NotOrderOwner,

    /// Body shorter than [`MIN_REVIEW_LENGTH`].
    #[error("review must be at least {min} characters")]
    TooShort {
        /// Minimum length.
        min: usize,
    },

    /// Body longer than [`MAX_REVIEW_LENGTH`].
    #[error("review must be at most {max} characters")]
    TooLong {
        /// Maximum length.
        max: usize,
    },
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// Order being reviewed (one review per order).
    pub order_id: OrderId,
    /// Restaurant the order was placed with.
    pub restaurant_id: RestaurantId,
    /// Reviewer, when signed in.
    pub user_id: Option<UserId>,
    /// Star rating.
    pub rating: Rating,
    /// Review text.
    pub body: String,
    /// When the review was written.
    pub created_at: DateTime<Utc>,
    /// When the review was last edited.
    pub updated_at: DateTime<Utc>,
}

/// A review that passed every submission rule and can be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    /// Order being reviewed.
    pub order_id: OrderId,
    /// Restaurant the order was placed with.
    pub restaurant_id: RestaurantId,
    /// Reviewer, when signed in.
    pub user_id: Option<UserId>,
    /// Star rating.
    pub rating: Rating,
    /// Trimmed review text.
    pub body: String,
}

impl NewReview {
    /// Check that `reviewer` may review `order` and build the review.
    ///
    /// # Errors
    ///
    /// Fails if the reviewer did not place the order, the order is not
    /// completed, it was already reviewed, or the body length is out of range.
    pub fn for_order(
        order: &Order,
        reviewer: &Customer,
        rating: Rating,
        body: &str,
    ) -> Result<Self, ReviewError> {
        if order.customer != *reviewer {
            return Err(ReviewError::NotOrderOwner);
        }
        if order.status != OrderStatus::Completed {
            return Err(ReviewError::OrderNotCompleted(order.status));
        }
        if order.reviewed {
            return Err(ReviewError::AlreadyReviewed);
        }
        let body = validate_body(body)?;

        Ok(Self {
            order_id: order.id,
            restaurant_id: order.restaurant_id,
            user_id: order.customer.user_id(),
            rating,
            body,
        })
    }
}

/// Trim a review body and check its length.
///
/// # Errors
///
/// Returns [`ReviewError::TooShort`] or [`ReviewError::TooLong`].
pub fn validate_body(body: &str) -> Result<String, ReviewError> {
    let body = body.trim();
    let len = body.chars().count();
    if len < MIN_REVIEW_LENGTH {
        return Err(ReviewError::TooShort {
            min: MIN_REVIEW_LENGTH,
        });
    }
    if len > MAX_REVIEW_LENGTH {
        return Err(ReviewError::TooLong {
            max: MAX_REVIEW_LENGTH,
        });
    }
    Ok(body.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dineease_core::{GuestId, Price};

    use super::*;

    fn order(status: OrderStatus, customer: Customer) -> Order {
        Order {
            id: OrderId::new(3),
            restaurant_id: RestaurantId::new(2),
            customer,
            status,
            items: Vec::new(),
            total_price: Price::from_cents(1000),
            discount_applied: Price::ZERO,
            coupon_id: None,
            reviewed: false,
            created_at: Utc::now(),
        }
    }

    fn five() -> Rating {
        Rating::new(5).unwrap()
    }

    #[test]
    fn test_completed_order_can_be_reviewed() {
        let customer = Customer::User(UserId::new(1));
        let o = order(OrderStatus::Completed, customer);
        let review = NewReview::for_order(&o, &customer, five(), "  Lovely biryani!  ").unwrap();
        assert_eq!(review.body, "Lovely biryani!");
        assert_eq!(review.restaurant_id, RestaurantId::new(2));
        assert_eq!(review.user_id, Some(UserId::new(1)));
    }

    #[test]
    fn test_guest_review_has_no_user() {
        let guest = Customer::Guest(GuestId::generate());
        let o = order(OrderStatus::Completed, guest);
        let review = NewReview::for_order(&o, &guest, five(), "Great food, fast!").unwrap();
        assert_eq!(review.user_id, None);
    }

    #[test]
    fn test_non_completed_orders_rejected() {
        let customer = Customer::User(UserId::new(1));
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Cancelled,
        ] {
            let o = order(status, customer);
            assert_eq!(
                NewReview::for_order(&o, &customer, five(), "Long enough text"),
                Err(ReviewError::OrderNotCompleted(status))
            );
        }
    }

    #[test]
    fn test_second_review_rejected() {
        let customer = Customer::User(UserId::new(1));
        let mut o = order(OrderStatus::Completed, customer);
        o.reviewed = true;
        assert_eq!(
            NewReview::for_order(&o, &customer, five(), "Long enough text"),
            Err(ReviewError::AlreadyReviewed)
        );
    }

    #[test]
    fn test_other_customer_rejected() {
        let o = order(OrderStatus::Completed, Customer::User(UserId::new(1)));
        assert_eq!(
            NewReview::for_order(&o, &Customer::User(UserId::new(2)), five(), "Long enough text"),
            Err(ReviewError::NotOrderOwner)
        );
    }

    #[test]
    fn test_body_length_bounds() {
        assert_eq!(
            validate_body("too short"),
            Err(ReviewError::TooShort { min: 10 })
        );
        assert_eq!(validate_body("exactly 10").unwrap(), "exactly 10");
        assert_eq!(
            validate_body(&"x".repeat(2001)),
            Err(ReviewError::TooLong { max: 2000 })
        );
    }
}
