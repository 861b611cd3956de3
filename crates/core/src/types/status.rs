//! Status and category enums for restaurant entities.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum from its string form fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    /// Build an error for `value`, which failed to parse as a `kind`.
    #[must_use]
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle status of an order.
///
/// Orders move forward only:
///
/// ```text
/// Pending -> Preparing -> Completed
///    |           |
///    +-----------+-----> Cancelled
/// ```
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, not yet picked up by the kitchen.
    #[default]
    Pending,
    /// Being prepared by the restaurant.
    Preparing,
    /// Handed over to the customer.
    Completed,
    /// Abandoned before completion.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Preparing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether no further transitions are allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Preparing)
                | (Self::Preparing, Self::Completed)
                | (Self::Pending | Self::Preparing, Self::Cancelled)
        )
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Preparing => "Preparing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Preparing => write!(f, "preparing"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" => Ok(Self::Preparing),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

/// Cuisine served by a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "cuisine", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Cuisine {
    #[default]
    Indian,
    Chinese,
    Thai,
    Italian,
}

impl Cuisine {
    /// Every cuisine offered in the catalog filter.
    pub const ALL: [Self; 4] = [Self::Indian, Self::Chinese, Self::Thai, Self::Italian];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Indian => "Indian",
            Self::Chinese => "Chinese",
            Self::Thai => "Thai",
            Self::Italian => "Italian",
        }
    }
}

impl std::fmt::Display for Cuisine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Indian => write!(f, "indian"),
            Self::Chinese => write!(f, "chinese"),
            Self::Thai => write!(f, "thai"),
            Self::Italian => write!(f, "italian"),
        }
    }
}

impl std::str::FromStr for Cuisine {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indian" => Ok(Self::Indian),
            "chinese" => Ok(Self::Chinese),
            "thai" => Ok(Self::Thai),
            "italian" => Ok(Self::Italian),
            _ => Err(ParseEnumError::new("cuisine", s)),
        }
    }
}
