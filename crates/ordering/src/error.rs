//! Unified error handling.
//!
//! Every service call returns `Result<T, AppError>`. Callers show
//! [`AppError::user_message`] to the customer or owner; internal failures are
//! logged and masked.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::forms::FormErrors;
use crate::models::coupon::CouponError;
use crate::models::order::OrderError;
use crate::models::review::ReviewError;
use crate::services::emotion::EmotionError;

/// Text shown in place of internal error details.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Order rule violated.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Coupon could not be created or applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Review was rejected.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Captured frame could not be decoded.
    #[error("Emotion error: {0}")]
    Emotion(#[from] EmotionError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Submitted form failed validation.
    #[error(transparent)]
    Validation(#[from] FormErrors),

    /// Resource not found (restaurant, menu item, order).
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl AppError {
    /// Whether this is a server-side failure rather than a user mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Repository(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
                | Self::Config(_)
                | Self::Emotion(EmotionError::InvalidModel(_))
        )
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_internal() {
            return GENERIC_MESSAGE.to_string();
        }
        match self {
            Self::Repository(RepositoryError::NotFound) => "Not found.".to_string(),
            Self::Repository(RepositoryError::Conflict(message)) => message.clone(),
            Self::NotFound(what) => format!("{what} not found."),
            Self::Order(e) => e.to_string(),
            Self::Coupon(e) => e.to_string(),
            Self::Review(e) => e.to_string(),
            Self::Emotion(e) => e.to_string(),
            Self::Validation(e) => e.to_string(),
            Self::Repository(_) | Self::Config(_) => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Log internal failures at error level and user mistakes at debug.
    pub fn log(&self) {
        if self.is_internal() {
            tracing::error!(error = %self, "Request error");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
