//! Star rating type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value is outside 1..=5.
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i64),
    /// The input is not an integer.
    #[error("rating must be a whole number")]
    NotANumber,
}

/// A 1-5 star rating.
///
/// ```
/// use dineease_core::Rating;
///
/// assert_eq!(Rating::new(5).unwrap().stars(), 5);
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating.
    pub const MIN: Self = Self(1);
    /// Highest rating.
    pub const MAX: Self = Self(5);
    /// Neutral fallback rating.
    pub const NEUTRAL: Self = Self(3);

    /// Create a rating from a star count.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] unless `stars` is within 1..=5.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        match u8::try_from(stars) {
            Ok(s @ 1..=5) => Ok(Self(s)),
            _ => Err(RatingError::OutOfRange(stars)),
        }
    }

    /// Create a rating, clamping `stars` into 1..=5.
    #[must_use]
    pub const fn saturating(stars: u8) -> Self {
        if stars < 1 {
            Self::MIN
        } else if stars > 5 {
            Self::MAX
        } else {
            Self(stars)
        }
    }

    /// Parse a rating from form input.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::NotANumber`] for non-integer input, or
    /// [`RatingError::OutOfRange`].
    pub fn parse(s: &str) -> Result<Self, RatingError> {
        let stars: i64 = s.trim().parse().map_err(|_| RatingError::NotANumber)?;
        Self::new(stars)
    }

    /// Star count (1-5).
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Rating {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Rating {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let stars = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(stars))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Rating {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(*self), buf)
    }
}
