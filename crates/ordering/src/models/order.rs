//! Order aggregate: orders, their line items, and the two-phase builder that
//! finalizes totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dineease_core::{
    CouponId, Customer, MenuItemId, OrderId, OrderItemId, OrderStatus, Price, RestaurantId,
};

use super::restaurant::MenuItem;

/// Largest quantity accepted for a single line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors raised by the order aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity outside 1..=[`MAX_LINE_QUANTITY`].
    #[error("quantity must be between 1 and {max}, got {0}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity(u32),

    /// The menu item is served by a different restaurant.
    #[error("{item} is not on this restaurant's menu")]
    ForeignMenuItem {
        /// Name of the offending item.
        item: String,
    },

    /// The menu item has been removed by the owner.
    #[error("{item} is no longer available")]
    UnavailableMenuItem {
        /// Name of the offending item.
        item: String,
    },

    /// `build()` was called before any line item was added.
    #[error("an order needs at least one item")]
    Empty,

    /// The requested status change is not allowed.
    #[error("cannot move an order from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// A line being assembled by [`OrderBuilder`], before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Menu item ordered.
    pub menu_item_id: MenuItemId,
    /// Menu item name at order time.
    pub name: String,
    /// Unit price at order time.
    pub unit_price: Price,
    /// Number of portions (1..=99).
    pub quantity: u32,
}

impl OrderLine {
    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line item ID.
    pub id: OrderItemId,
    /// Menu item ordered.
    pub menu_item_id: MenuItemId,
    /// Menu item name at order time.
    pub name: String,
    /// Unit price at order time.
    pub unit_price: Price,
    /// Number of portions.
    pub quantity: u32,
}

impl OrderItem {
    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A customer's order at one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Restaurant the order was placed with.
    pub restaurant_id: RestaurantId,
    /// Signed-in user or guest who placed the order.
    pub customer: Customer,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Line items (at least one).
    pub items: Vec<OrderItem>,
    /// Subtotal minus `discount_applied`.
    pub total_price: Price,
    /// Discount taken off by the attached coupon (zero without one).
    pub discount_applied: Price,
    /// Coupon that produced `discount_applied`.
    pub coupon_id: Option<CouponId>,
    /// Whether the customer has left a review.
    pub reviewed: bool,
    /// When the order was placed. Never changes.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of `unit_price * quantity` over every line.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Recompute `total_price` from the lines and the stored discount.
    ///
    /// The total is clamped at zero.
    pub fn recompute_total(&mut self) {
        self.total_price = self.subtotal().saturating_sub(self.discount_applied);
    }

    /// Move the order to `next`, returning the previous status.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] unless the move is one of
    /// Pending→Preparing, Preparing→Completed, or Pending|Preparing→Cancelled.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        Ok(std::mem::replace(&mut self.status, next))
    }

    /// Total number of portions across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// A finalized order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    /// Restaurant the order is placed with.
    pub restaurant_id: RestaurantId,
    /// Who is ordering.
    pub customer: Customer,
    /// Line items, one per distinct menu item.
    pub lines: Vec<OrderLine>,
    /// Sum of line totals (no discount at creation).
    pub total_price: Price,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Two-phase order construction.
///
/// Lines are collected first; [`OrderBuilder::build`] computes the total once
/// all of them are known.
///
/// ```
/// # use chrono::Utc;
/// # use dineease_core::{Customer, MenuItemId, Price, RestaurantId, UserId};
/// # use dineease_ordering::models::{MenuItem, OrderBuilder};
/// let restaurant = RestaurantId::new(1);
/// let naan = MenuItem {
///     id: MenuItemId::new(1),
///     restaurant_id: restaurant,
///     name: "Naan".into(),
///     price: Price::from_cents(500),
///     description: String::new(),
///     image: None,
///     archived_at: None,
/// };
///
/// let mut builder = OrderBuilder::new(restaurant, Customer::User(UserId::new(1)));
/// builder.add_line_item(&naan, 2).unwrap();
/// let order = builder.build(Utc::now()).unwrap();
/// assert_eq!(order.total_price, Price::from_cents(1000));
/// ```
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    restaurant_id: RestaurantId,
    customer: Customer,
    lines: BTreeMap<MenuItemId, OrderLine>,
}

impl OrderBuilder {
    /// Start an order for `customer` at `restaurant_id`.
    #[must_use]
    pub const fn new(restaurant_id: RestaurantId, customer: Customer) -> Self {
        Self {
            restaurant_id,
            customer,
            lines: BTreeMap::new(),
        }
    }

    /// Add `quantity` portions of `item`.
    ///
    /// Adding the same menu item twice merges into one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity (or merged quantity) is outside
    /// 1..=[`MAX_LINE_QUANTITY`], or the item is archived or belongs to another
    /// restaurant.
    pub fn add_line_item(
        &mut self,
        item: &MenuItem,
        quantity: u32,
    ) -> Result<&mut Self, OrderError> {
        if item.restaurant_id != self.restaurant_id {
            return Err(OrderError::ForeignMenuItem {
                item: item.name.clone(),
            });
        }
        if !item.is_orderable() {
            return Err(OrderError::UnavailableMenuItem {
                item: item.name.clone(),
            });
        }
        if quantity == 0 || quantity > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity(quantity));
        }

        let merged = self
            .lines
            .get(&item.id)
            .map_or(quantity, |line| line.quantity.saturating_add(quantity));
        if merged > MAX_LINE_QUANTITY {
            return Err(OrderError::InvalidQuantity(merged));
        }

        self.lines.insert(
            item.id,
            OrderLine {
                menu_item_id: item.id,
                name: item.name.clone(),
                unit_price: item.price,
                quantity: merged,
            },
        );
        Ok(self)
    }

    /// Number of distinct lines collected so far.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Finalize the order and compute its total.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Empty`] if no line was added.
    pub fn build(self, now: DateTime<Utc>) -> Result<NewOrder, OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::Empty);
        }
        let lines: Vec<OrderLine> = self.lines.into_values().collect();
        let total_price = lines.iter().map(OrderLine::line_total).sum();

        Ok(NewOrder {
            restaurant_id: self.restaurant_id,
            customer: self.customer,
            lines,
            total_price,
            created_at: now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dineease_core::{GuestId, UserId};

    fn menu_item(id: i32, restaurant: i32, cents: i64) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(id),
            restaurant_id: RestaurantId::new(restaurant),
            name: format!("Dish {id}"),
            price: Price::from_cents(cents),
            description: String::new(),
            image: None,
            archived_at: None,
        }
    }

    fn builder() -> OrderBuilder {
        OrderBuilder::new(RestaurantId::new(1), Customer::User(UserId::new(1)))
    }

    fn persisted(new: NewOrder) -> Order {
        Order {
            id: OrderId::new(1),
            restaurant_id: new.restaurant_id,
            customer: new.customer,
            status: OrderStatus::Pending,
            items: new
                .lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| OrderItem {
                    id: OrderItemId::new(i32::try_from(i).unwrap() + 1),
                    menu_item_id: line.menu_item_id,
                    name: line.name,
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            total_price: new.total_price,
            discount_applied: Price::ZERO,
            coupon_id: None,
            reviewed: false,
            created_at: new.created_at,
        }
    }

    #[test]
    fn test_build_sums_quantity_times_price() {
        let mut b = builder();
        b.add_line_item(&menu_item(1, 1, 500), 2).unwrap();
        b.add_line_item(&menu_item(2, 1, 1000), 1).unwrap();
        let order = b.build(Utc::now()).unwrap();
        assert_eq!(order.total_price, Price::from_cents(2000));
        assert_eq!(order.lines.len(), 2);
    }

    #[test]
    fn test_repeated_item_merges_into_one_line() {
        let mut b = builder();
        let item = menu_item(1, 1, 250);
        b.add_line_item(&item, 1).unwrap().add_line_item(&item, 3).unwrap();
        assert_eq!(b.line_count(), 1);
        let order = b.build(Utc::now()).unwrap();
        assert_eq!(order.lines[0].quantity, 4);
        assert_eq!(order.total_price, Price::from_cents(1000));
    }

    #[test]
    fn test_rejects_zero_and_excessive_quantity() {
        let mut b = builder();
        let item = menu_item(1, 1, 250);
        assert_eq!(
            b.add_line_item(&item, 0).unwrap_err(),
            OrderError::InvalidQuantity(0)
        );
        assert_eq!(
            b.add_line_item(&item, 100).unwrap_err(),
            OrderError::InvalidQuantity(100)
        );
        b.add_line_item(&item, 90).unwrap();
        assert_eq!(
            b.add_line_item(&item, 10).unwrap_err(),
            OrderError::InvalidQuantity(100)
        );
    }

    #[test]
    fn test_rejects_item_from_other_restaurant() {
        let mut b = builder();
        let err = b.add_line_item(&menu_item(1, 2, 250), 1).unwrap_err();
        assert!(matches!(err, OrderError::ForeignMenuItem { .. }));
    }

    #[test]
    fn test_rejects_archived_item() {
        let mut b = builder();
        let mut item = menu_item(1, 1, 250);
        item.archived_at = Some(Utc::now());
        let err = b.add_line_item(&item, 1).unwrap_err();
        assert_eq!(err.to_string(), "Dish 1 is no longer available");
    }

    #[test]
    fn test_build_rejects_empty_order() {
        let b = OrderBuilder::new(RestaurantId::new(1), Customer::Guest(GuestId::generate()));
        assert_eq!(b.build(Utc::now()).unwrap_err(), OrderError::Empty);
    }

    #[test]
    fn test_recompute_total_subtracts_discount_and_clamps() {
        let mut b = builder();
        b.add_line_item(&menu_item(1, 1, 500), 2).unwrap();
        let mut order = persisted(b.build(Utc::now()).unwrap());

        order.discount_applied = Price::from_cents(300);
        order.recompute_total();
        assert_eq!(order.total_price, Price::from_cents(700));

        order.discount_applied = Price::from_cents(5000);
        order.recompute_total();
        assert_eq!(order.total_price, Price::ZERO);
    }

    #[test]
    fn test_transition_forward_only() {
        let mut b = builder();
        b.add_line_item(&menu_item(1, 1, 500), 1).unwrap();
        let mut order = persisted(b.build(Utc::now()).unwrap());

        assert_eq!(
            order.transition_to(OrderStatus::Preparing).unwrap(),
            OrderStatus::Pending
        );
        assert_eq!(
            order.transition_to(OrderStatus::Pending).unwrap_err(),
            OrderError::InvalidTransition {
                from: OrderStatus::Preparing,
                to: OrderStatus::Pending
            }
        );
        order.transition_to(OrderStatus::Completed).unwrap();
        let err = order.transition_to(OrderStatus::Cancelled).unwrap_err();
        assert_eq!(err.to_string(), "cannot move an order from Completed to Cancelled");
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn test_item_count() {
        let mut b = builder();
        b.add_line_item(&menu_item(1, 1, 500), 2).unwrap();
        b.add_line_item(&menu_item(2, 1, 100), 3).unwrap();
        let order = persisted(b.build(Utc::now()).unwrap());
        assert_eq!(order.item_count(), 5);
        assert_eq!(order.subtotal(), Price::from_cents(1300));
    }
}
