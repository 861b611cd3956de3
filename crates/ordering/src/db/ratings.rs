//! Customer emotion rating repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use dineease_core::{CustomerRatingId, Rating, UserId};

use super::RepositoryError;
use crate::models::customer_rating::{CustomerRating, Emotion, EmotionScores, NewCustomerRating};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRatingRow {
    id: i32,
    user_id: Option<i32>,
    rating: Rating,
    dominant_emotion: String,
    emotion_scores: Json<EmotionScores>,
    table_number: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRatingRow> for CustomerRating {
    type Error = RepositoryError;

    fn try_from(row: CustomerRatingRow) -> Result<Self, Self::Error> {
        let dominant_emotion = row.dominant_emotion.parse::<Emotion>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid emotion in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerRatingId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            rating: row.rating,
            dominant_emotion,
            emotion_scores: row.emotion_scores.0,
            table_number: row.table_number,
            created_at: row.created_at,
        })
    }
}

const RATING_COLUMNS: &str =
    "id, user_id, rating, dominant_emotion, emotion_scores, table_number, created_at";

/// Repository for webcam ratings.
pub struct CustomerRatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        rating: &NewCustomerRating,
    ) -> Result<CustomerRating, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRatingRow>(&format!(
            r"
            INSERT INTO customer_ratings
                (user_id, rating, dominant_emotion, emotion_scores, table_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RATING_COLUMNS}
            "
        ))
        .bind(rating.user_id.map(|id| id.as_i32()))
        .bind(rating.rating)
        .bind(rating.dominant_emotion.as_str())
        .bind(Json(&rating.emotion_scores))
        .bind(rating.table_number)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Most recent ratings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored label is unknown.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<CustomerRating>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRatingRow>(&format!(
            r"
            SELECT {RATING_COLUMNS}
            FROM customer_ratings
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
