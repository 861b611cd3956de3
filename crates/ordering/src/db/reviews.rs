//! Review repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use dineease_core::{OrderId, Rating, RestaurantId, ReviewId, UserId};

use super::{RepositoryError, to_u64};
use crate::models::report::RatingSummary;
use crate::models::review::{NewReview, Review};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    order_id: i32,
    restaurant_id: i32,
    user_id: Option<i32>,
    rating: Rating,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            order_id: OrderId::new(row.order_id),
            restaurant_id: RestaurantId::new(row.restaurant_id),
            user_id: row.user_id.map(UserId::new),
            rating: row.rating,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, order_id, restaurant_id, user_id, rating, body, created_at, updated_at";

/// Repository for reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order already has a review.
    pub async fn insert(
        conn: &mut PgConnection,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            INSERT INTO reviews (order_id, restaurant_id, user_id, rating, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(review.order_id.as_i32())
        .bind(review.restaurant_id.as_i32())
        .bind(review.user_id.map(|id| id.as_i32()))
        .bind(review.rating)
        .bind(&review.body)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            let message = format!("order {} already has a review", review.order_id);
            RepositoryError::conflict_on_unique(e, message)
        })?;

        Ok(row.into())
    }

    /// The review of an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE order_id = $1"
        ))
        .bind(order_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Reviews of a restaurant, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE restaurant_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(restaurant_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Review count and mean rating of a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_summary(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<RatingSummary, RepositoryError> {
        let (count, mean): (i64, Option<Decimal>) = sqlx::query_as(
            "SELECT COUNT(*), AVG(rating)::NUMERIC FROM reviews WHERE restaurant_id = $1",
        )
        .bind(restaurant_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(RatingSummary::new(to_u64(count, "review count")?, mean))
    }
}
