//! Table-side rating capture.

use sqlx::PgPool;
use tracing::{Instrument, instrument};

use crate::context::RequestContext;
use crate::db::CustomerRatingRepository;
use crate::error::Result;
use crate::models::customer_rating::{CustomerRating, NewCustomerRating};
use crate::services::emotion::{self, EmotionError, EmotionReading, FaceDetector};

/// Rating capture service.
pub struct RatingService<'a> {
    ratings: CustomerRatingRepository<'a>,
    detector: &'a dyn FaceDetector,
}

impl<'a> RatingService<'a> {
    /// Create a rating service finding faces with `detector`, normally a
    /// [`SeetaFaceDetector`](crate::services::SeetaFaceDetector).
    #[must_use]
    pub const fn new(pool: &'a PgPool, detector: &'a dyn FaceDetector) -> Self {
        Self {
            ratings: CustomerRatingRepository::new(pool),
            detector,
        }
    }

    /// Analyse a captured frame and store the resulting rating.
    ///
    /// `payload` is a `data:` URL or bare base64. An image that decodes but
    /// cannot be analysed is stored as the neutral "unknown" reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Emotion` if the payload is empty or not base64,
    /// and a repository error if the insert fails.
    #[instrument(skip(self, ctx, payload))]
    pub async fn capture(
        &self,
        ctx: &RequestContext,
        payload: &str,
        table_number: Option<i32>,
    ) -> Result<CustomerRating> {
        let reading = read_payload(payload, self.detector)?;
        self.store(ctx, reading, table_number).await
    }

    /// Analyse raw image bytes (as read from a file) and store the rating.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Emotion` if `bytes` is empty and a repository error
    /// if the insert fails.
    #[instrument(skip(self, ctx, bytes), fields(size = bytes.len()))]
    pub async fn capture_image(
        &self,
        ctx: &RequestContext,
        bytes: &[u8],
        table_number: Option<i32>,
    ) -> Result<CustomerRating> {
        let reading = recover(emotion::decode_image(bytes), self.detector)?;
        self.store(ctx, reading, table_number).await
    }

    /// Most recent ratings, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<CustomerRating>> {
        Ok(self.ratings.list_recent(limit).await?)
    }

    async fn store(
        &self,
        ctx: &RequestContext,
        reading: EmotionReading,
        table_number: Option<i32>,
    ) -> Result<CustomerRating> {
        async {
            let rating = self
                .ratings
                .insert(&NewCustomerRating {
                    user_id: ctx.customer.user_id(),
                    rating: reading.rating,
                    dominant_emotion: reading.dominant_emotion,
                    emotion_scores: reading.scores,
                    table_number,
                })
                .await?;
            tracing::info!(
                rating_id = %rating.id,
                stars = rating.rating.stars(),
                emotion = %rating.dominant_emotion,
                "Stored customer rating"
            );
            Ok(rating)
        }
        .instrument(ctx.span("capture_rating"))
        .await
    }
}

/// Decode and analyse a frame payload.
///
/// # Errors
///
/// Returns [`EmotionError::Empty`] when there is nothing to analyse and
/// [`EmotionError::InvalidBase64`] when the payload is not base64. Bytes that
/// are not a readable image yield [`EmotionReading::unknown`].
pub fn read_payload(payload: &str, detector: &dyn FaceDetector) -> Result<EmotionReading> {
    recover(emotion::decode_frame(payload), detector)
}

fn recover(
    frame: std::result::Result<image::GrayImage, EmotionError>,
    detector: &dyn FaceDetector,
) -> Result<EmotionReading> {
    match frame {
        Ok(frame) => Ok(emotion::analyze(&frame, detector)),
        Err(e @ (EmotionError::Empty | EmotionError::InvalidBase64(_))) => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not analyse frame");
            Ok(EmotionReading::unknown())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::error::AppError;
    use crate::models::customer_rating::Emotion;
    use crate::services::emotion::WholeFrame;

    #[test]
    fn test_empty_payload_is_an_error() {
        let err = read_payload("data:image/jpeg;base64,", &WholeFrame).unwrap_err();
        assert!(matches!(err, AppError::Emotion(EmotionError::Empty)));
        assert_eq!(err.user_message(), "no image data received");
    }

    #[test]
    fn test_undecodable_image_is_unknown() {
        let reading = read_payload(&STANDARD.encode(b"garbage"), &WholeFrame).unwrap();
        assert_eq!(reading.dominant_emotion, Emotion::Unknown);
        assert_eq!(reading.rating.stars(), 3);
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let err = read_payload("not base64 at all!", &WholeFrame).unwrap_err();
        assert!(matches!(err, AppError::Emotion(EmotionError::InvalidBase64(_))));
        assert!(!err.is_internal());

        let err = read_payload("data:image/jpeg;base64,%%%%", &WholeFrame).unwrap_err();
        assert!(matches!(err, AppError::Emotion(EmotionError::InvalidBase64(_))));
    }
}
