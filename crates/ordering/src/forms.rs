//! Submitted form data and its validation.
//!
//! Each form is a plain struct of the raw submitted values with a
//! `validate()` method returning either typed input for a service call or a
//! [`FormErrors`] map of field name to messages for re-rendering.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use dineease_core::{CouponCode, Cuisine, MenuItemId, Price, Rating};

use crate::models::coupon::{CouponError, DEFAULT_DISCOUNT_PERCENTAGE, NewCoupon};
use crate::models::order::MAX_LINE_QUANTITY;
use crate::models::restaurant::{MenuItemInput, RestaurantInput};
use crate::models::review::validate_body;

/// Maximum length of names and locations.
pub const MAX_NAME_LENGTH: usize = 255;

// =============================================================================
// Errors
// =============================================================================

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid form: {}", summarize(.fields))]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

fn summarize(fields: &BTreeMap<&'static str, Vec<String>>) -> String {
    fields
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether no message was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// `Ok(value)` if no message was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

/// Trim a required text field, recording errors for blank or long input.
fn required_text(errors: &mut FormErrors, field: &'static str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            field,
            format!("Ensure this value has at most {MAX_NAME_LENGTH} characters."),
        );
    }
    value.to_owned()
}

/// Blank strings become `None`.
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// Catalog
// =============================================================================

/// Restaurant create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantForm {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    /// Blank selects the default cuisine.
    #[serde(default)]
    pub cuisine: String,
    pub image: Option<String>,
}

impl RestaurantForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for a blank or overlong name or location, or an
    /// unknown cuisine.
    pub fn validate(&self) -> Result<RestaurantInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&mut errors, "name", &self.name);
        let location = required_text(&mut errors, "location", &self.location);

        let cuisine = if self.cuisine.trim().is_empty() {
            Cuisine::default()
        } else {
            self.cuisine.parse().unwrap_or_else(|_| {
                errors.add(
                    "cuisine",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        self.cuisine.trim()
                    ),
                );
                Cuisine::default()
            })
        };

        errors.into_result(|| RestaurantInput {
            name,
            location,
            description: self.description.trim().to_owned(),
            cuisine,
            image: optional_text(self.image.as_deref()),
        })
    }
}

/// Menu item create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemForm {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

impl MenuItemForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for a blank name or a price that is not a
    /// positive amount with at most two decimal places.
    pub fn validate(&self) -> Result<MenuItemInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&mut errors, "name", &self.name);
        let price = Price::parse(&self.price).map_err(|e| errors.add("price", e.to_string()));

        match price {
            Ok(price) => errors.into_result(|| MenuItemInput {
                name,
                price,
                description: self.description.trim().to_owned(),
                image: optional_text(self.image.as_deref()),
            }),
            Err(()) => Err(errors),
        }
    }
}

// =============================================================================
// Ordering
// =============================================================================

/// One quantity input on the menu page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLineForm {
    /// Menu item picked
    pub menu_item_id: i32,
    /// Quantity entered; zero lines are dropped
    pub quantity: i64,
}

/// The "place order" form: a quantity per menu item plus an optional coupon.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderForm {
    #[serde(default)]
    pub lines: Vec<OrderLineForm>,
    #[serde(default)]
    pub coupon_code: String,
}

/// Validated order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrderInput {
    /// Menu item and quantity for each non-zero line, in submitted order.
    pub lines: Vec<(MenuItemId, u32)>,
    /// Coupon to apply once the order is built.
    pub coupon: Option<CouponCode>,
}

impl PlaceOrderForm {
    /// Validate the form.
    ///
    /// Lines left at zero are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for negative or overlarge quantities, an order
    /// with no items, or a malformed coupon code.
    pub fn validate(&self) -> Result<PlaceOrderInput, FormErrors> {
        let mut errors = FormErrors::new();
        let mut lines = Vec::new();

        for line in &self.lines {
            match u32::try_from(line.quantity) {
                Ok(0) => {}
                Ok(quantity) if quantity <= MAX_LINE_QUANTITY => {
                    lines.push((MenuItemId::new(line.menu_item_id), quantity));
                }
                _ => errors.add(
                    "lines",
                    format!(
                        "Quantity must be between 0 and {MAX_LINE_QUANTITY} (got {}).",
                        line.quantity
                    ),
                ),
            }
        }
        if lines.is_empty() && errors.is_empty() {
            errors.add("lines", "Please select at least one item.");
        }

        let coupon = CouponApplyForm {
            code: self.coupon_code.clone(),
        }
        .validate()
        .unwrap_or_else(|e| {
            for (field, messages) in e.iter() {
                for message in messages {
                    let field = if field == "code" { "coupon_code" } else { field };
                    errors.add(field, message.clone());
                }
            }
            None
        });

        errors.into_result(|| PlaceOrderInput { lines, coupon })
    }
}

/// Coupon entry box. Blank means "no coupon".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponApplyForm {
    #[serde(default)]
    pub code: String,
}

impl CouponApplyForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for a code that is too long or contains
    /// characters other than letters, digits, `-` and `_`.
    pub fn validate(&self) -> Result<Option<CouponCode>, FormErrors> {
        if self.code.trim().is_empty() {
            return Ok(None);
        }
        CouponCode::parse(&self.code).map(Some).map_err(|e| {
            let mut errors = FormErrors::new();
            errors.add("code", e.to_string());
            errors
        })
    }
}

/// Owner coupon creation form.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponForm {
    /// Blank generates a code.
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_percentage")]
    pub discount_percentage: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_percentage() -> i64 {
    i64::from(DEFAULT_DISCOUNT_PERCENTAGE)
}

const fn default_active() -> bool {
    true
}

impl CouponForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for a malformed code, a percentage outside
    /// 1..=100, or a window that ends before it starts.
    pub fn validate(&self) -> Result<NewCoupon, FormErrors> {
        let mut errors = FormErrors::new();

        let code = CouponApplyForm {
            code: self.code.clone(),
        }
        .validate()
        .unwrap_or_else(|e| {
            for message in e.get("code") {
                errors.add("code", message.clone());
            }
            None
        });
        if !errors.is_empty() {
            return Err(errors);
        }

        NewCoupon::new(
            code,
            self.discount_percentage,
            self.valid_from,
            self.valid_to,
            self.is_active,
        )
        .map_err(|e| {
            let field = match e {
                CouponError::InvalidWindow => "valid_to",
                _ => "discount_percentage",
            };
            errors.add(field, e.to_string());
            errors
        })
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// Review submission form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    pub body: String,
}

/// Validated review fields; the order checks happen in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: Rating,
    pub body: String,
}

impl ReviewForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`FormErrors`] for a rating outside 1..=5 or a body shorter
    /// than 10 characters once trimmed.
    pub fn validate(&self) -> Result<ReviewInput, FormErrors> {
        let mut errors = FormErrors::new();
        let rating = Rating::parse(&self.rating).map_err(|e| errors.add("rating", e.to_string()));
        let body = validate_body(&self.body).map_err(|e| errors.add("body", e.to_string()));

        match (rating, body) {
            (Ok(rating), Ok(body)) => Ok(ReviewInput { rating, body }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn line(menu_item_id: i32, quantity: i64) -> OrderLineForm {
        OrderLineForm {
            menu_item_id,
            quantity,
        }
    }

    #[test]
    fn test_restaurant_form_defaults_cuisine() {
        let form = RestaurantForm {
            name: " Spice Route ".into(),
            location: "Main St".into(),
            ..Default::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.name, "Spice Route");
        assert_eq!(input.cuisine, Cuisine::Indian);
        assert_eq!(input.image, None);
    }

    #[test]
    fn test_restaurant_form_reports_every_field() {
        let form = RestaurantForm {
            name: "  ".into(),
            location: String::new(),
            cuisine: "mexican".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), ["This field is required."]);
        assert_eq!(errors.get("location").len(), 1);
        assert_eq!(errors.get("cuisine").len(), 1);
    }

    #[test]
    fn test_menu_item_form_price_rules() {
        let mut form = MenuItemForm {
            name: "Naan".into(),
            price: "2.50".into(),
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap().price, Price::from_cents(250));

        form.price = "0".into();
        assert!(!form.validate().unwrap_err().get("price").is_empty());

        form.price = "1.999".into();
        assert!(!form.validate().unwrap_err().get("price").is_empty());

        form.price = "abc".into();
        assert!(!form.validate().unwrap_err().get("price").is_empty());
    }

    #[test]
    fn test_place_order_skips_zero_lines() {
        let form = PlaceOrderForm {
            lines: vec![
                line(1, 2),
                line(2, 0),
                line(3, 1),
            ],
            coupon_code: String::new(),
        };
        let input = form.validate().unwrap();
        assert_eq!(
            input.lines,
            vec![(MenuItemId::new(1), 2), (MenuItemId::new(3), 1)]
        );
        assert_eq!(input.coupon, None);
    }

    #[test]
    fn test_place_order_requires_an_item() {
        let form = PlaceOrderForm {
            lines: vec![line(1, 0)],
            coupon_code: String::new(),
        };
        assert_eq!(
            form.validate().unwrap_err().get("lines"),
            ["Please select at least one item."]
        );
    }

    #[test]
    fn test_place_order_rejects_bad_quantities_and_coupon() {
        let form = PlaceOrderForm {
            lines: vec![
                line(1, -1),
                line(2, 100),
            ],
            coupon_code: "bad code!".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("lines").len(), 2);
        assert_eq!(errors.get("coupon_code").len(), 1);
    }

    #[test]
    fn test_place_order_normalizes_coupon() {
        let form = PlaceOrderForm {
            lines: vec![line(1, 1)],
            coupon_code: " save10 ".into(),
        };
        assert_eq!(
            form.validate().unwrap().coupon,
            Some(CouponCode::parse("SAVE10").unwrap())
        );
    }

    #[test]
    fn test_coupon_apply_form_blank_is_none() {
        let form = CouponApplyForm { code: "   ".into() };
        assert_eq!(form.validate().unwrap(), None);
    }

    #[test]
    fn test_coupon_form_maps_errors_to_fields() {
        let now = Utc::now();
        let mut form = CouponForm {
            code: String::new(),
            discount_percentage: 150,
            valid_from: now,
            valid_to: now + Duration::days(7),
            is_active: true,
        };
        assert_eq!(form.validate().unwrap_err().get("discount_percentage").len(), 1);

        form.discount_percentage = 20;
        form.valid_to = now - Duration::days(1);
        assert_eq!(form.validate().unwrap_err().get("valid_to").len(), 1);

        form.valid_to = now + Duration::days(1);
        let coupon = form.validate().unwrap();
        assert_eq!(coupon.discount_percentage, 20);
        assert_eq!(coupon.code.as_str().len(), 8);
    }

    #[test]
    fn test_coupon_form_deserializes_defaults() {
        let form: CouponForm = serde_json::from_str(
            r#"{"valid_from":"2026-01-01T00:00:00Z","valid_to":"2026-12-31T23:59:59Z"}"#,
        )
        .unwrap();
        assert_eq!(form.discount_percentage, 10);
        assert!(form.is_active);
    }

    #[test]
    fn test_review_form() {
        let ok = ReviewForm {
            rating: "4".into(),
            body: "Really tasty curry".into(),
        };
        assert_eq!(ok.validate().unwrap().rating.stars(), 4);

        let bad = ReviewForm {
            rating: "9".into(),
            body: "meh".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.get("rating").len(), 1);
        assert_eq!(errors.get("body"), ["review must be at least 10 characters"]);
        assert!(errors.to_string().starts_with("invalid form: body: "));
    }
}
