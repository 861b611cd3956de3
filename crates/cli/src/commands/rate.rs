//! Table-side rating from an image file.
//!
//! # Usage
//!
//! ```bash
//! # Find faces with the model at DINEEASE_FACE_MODEL
//! dineease rate frame.jpg --table 3
//!
//! # Use the largest of the given face regions instead
//! dineease rate frame.jpg --face 10,10,80,80 --face 200,40,120,120
//!
//! # Rate the whole frame
//! dineease rate frame.jpg --whole-frame
//! ```

use std::path::Path;

use dineease_ordering::OrderingConfig;
use dineease_ordering::services::{
    FaceDetector, FaceRegion, FixedRegions, RatingService, SeetaFaceDetector, WholeFrame,
};

/// Analyse `image` and store the rating.
///
/// # Errors
///
/// Returns an error if the file cannot be read, no detector is available, or
/// the rating cannot be stored.
pub async fn run(
    image: &Path,
    faces: Vec<FaceRegion>,
    whole_frame: bool,
    table: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = tokio::fs::read(image).await?;
    tracing::info!(path = %image.display(), size = bytes.len(), "Loaded image");

    let (config, pool) = super::connect().await?;
    let detector = detector(&config, faces, whole_frame).await?;

    let ctx = super::operator_context();
    let rating = RatingService::new(&pool, detector.as_ref())
        .capture_image(&ctx, &bytes, table)
        .await?;

    tracing::info!(
        rating = rating.rating.stars(),
        emotion = %rating.dominant_emotion,
        scores = ?rating.emotion_scores,
        "Rating stored"
    );
    Ok(())
}

/// Pick the face detector: explicit regions, the whole frame, or the
/// configured model.
async fn detector(
    config: &OrderingConfig,
    faces: Vec<FaceRegion>,
    whole_frame: bool,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    if whole_frame {
        return Ok(Box::new(WholeFrame));
    }
    if !faces.is_empty() {
        return Ok(Box::new(FixedRegions(faces)));
    }

    let Some(path) = &config.face_model else {
        return Err(
            "no face model configured: set DINEEASE_FACE_MODEL or pass --face/--whole-frame".into(),
        );
    };
    let model = tokio::fs::read(path).await?;
    tracing::info!(path = %path.display(), "Loaded face detection model");
    Ok(Box::new(SeetaFaceDetector::from_bytes(model)?))
}
