//! Table-side "emotion" rating from a captured webcam frame.
//!
//! This is a placeholder heuristic, not emotion recognition: the largest face
//! region is converted to grayscale and its mean brightness is bucketed into a
//! 1-5 rating with a fixed score table. Faces are found by a
//! [`FaceDetector`]: [`SeetaFaceDetector`] runs the `SeetaFace` frontal
//! cascade through `rustface`, while [`FixedRegions`] and [`WholeFrame`] take
//! regions from the caller.

use core::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::GrayImage;
use thiserror::Error;

use dineease_core::Rating;

use crate::models::customer_rating::{Emotion, EmotionScores};

/// Errors raised while reading a captured frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmotionError {
    /// No image data was sent.
    #[error("no image data received")]
    Empty,

    /// The payload is not valid base64.
    #[error("image data is not valid base64: {0}")]
    InvalidBase64(String),

    /// The bytes are not a supported image.
    #[error("could not decode image: {0}")]
    InvalidImage(String),

    /// A face region string is malformed.
    #[error("invalid face region {0:?}, expected x,y,width,height")]
    InvalidRegion(String),

    /// The face detection model could not be loaded.
    #[error("invalid face detection model: {0}")]
    InvalidModel(String),
}

/// A detected face, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FaceRegion {
    /// Region with top-left corner at `(x, y)`.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region area in pixels.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl FromStr for FaceRegion {
    type Err = EmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| EmotionError::InvalidRegion(s.to_owned()))?;
        match parts[..] {
            [x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(EmotionError::InvalidRegion(s.to_owned())),
        }
    }
}

/// Finds faces in a grayscale frame.
pub trait FaceDetector: Send + Sync {
    /// Every face found, in any order.
    fn detect(&self, frame: &GrayImage) -> Vec<FaceRegion>;
}

/// Detector returning regions supplied up front (by the capture client or
/// the command line).
#[derive(Debug, Clone, Default)]
pub struct FixedRegions(pub Vec<FaceRegion>);

impl FaceDetector for FixedRegions {
    fn detect(&self, _frame: &GrayImage) -> Vec<FaceRegion> {
        self.0.clone()
    }
}

/// Detector treating the whole frame as one face.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFrame;

impl FaceDetector for WholeFrame {
    fn detect(&self, frame: &GrayImage) -> Vec<FaceRegion> {
        vec![FaceRegion::new(0, 0, frame.width(), frame.height())]
    }
}

/// Smallest face, in pixels, the model detector looks for.
pub const MIN_FACE_SIZE: u32 = 20;

/// Detector running the `SeetaFace` frontal face cascade.
///
/// The model file (`seeta_fd_frontal_v1.0.bin`) is distributed with
/// `rustface`; its path comes from `DINEEASE_FACE_MODEL`.
#[derive(Clone)]
pub struct SeetaFaceDetector {
    model: Vec<u8>,
}

impl core::fmt::Debug for SeetaFaceDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SeetaFaceDetector")
            .field("model_bytes", &self.model.len())
            .finish()
    }
}

impl SeetaFaceDetector {
    /// Build a detector from the bytes of a model file.
    ///
    /// # Errors
    ///
    /// Returns [`EmotionError::InvalidModel`] if the bytes are not a
    /// `SeetaFace` model.
    pub fn from_bytes(model: Vec<u8>) -> Result<Self, EmotionError> {
        rustface::read_model(model.as_slice())
            .map_err(|e| EmotionError::InvalidModel(e.to_string()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&self, frame: &GrayImage) -> Vec<FaceRegion> {
        let (width, height) = frame.dimensions();
        if width < MIN_FACE_SIZE || height < MIN_FACE_SIZE {
            return Vec::new();
        }
        let model = match rustface::read_model(self.model.as_slice()) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load face detection model");
                return Vec::new();
            }
        };

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let mut image = rustface::ImageData::new(frame.as_raw(), width, height);
        detector
            .detect(&mut image)
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                clip_box(bbox.x(), bbox.y(), bbox.width(), bbox.height(), width, height)
            })
            .collect()
    }
}

/// Clip a detector bounding box, which may start left of or above the frame,
/// to a frame of `frame_width` x `frame_height`.
fn clip_box(
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    frame_width: u32,
    frame_height: u32,
) -> Option<FaceRegion> {
    let clip = |origin: i32, extent: u32, limit: u32| -> Option<(u32, u32)> {
        let start = i64::from(origin).max(0);
        let end = (i64::from(origin) + i64::from(extent)).min(i64::from(limit));
        (end > start).then(|| {
            let start = u32::try_from(start).unwrap_or(u32::MAX);
            let end = u32::try_from(end).unwrap_or(u32::MAX);
            (start, end - start)
        })
    };
    let (x, width) = clip(x, width, frame_width)?;
    let (y, height) = clip(y, height, frame_height)?;
    Some(FaceRegion::new(x, y, width, height))
}

/// Result of analysing one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionReading {
    /// Stars derived from the face
    pub rating: Rating,
    /// Highest scoring emotion
    pub dominant_emotion: Emotion,
    /// Percentage per emotion, summing to 100
    pub scores: EmotionScores,
}

impl EmotionReading {
    fn new(stars: u8, dominant_emotion: Emotion, scores: [(Emotion, u8); 3]) -> Self {
        Self {
            rating: Rating::saturating(stars),
            dominant_emotion,
            scores: EmotionScores::from(scores),
        }
    }

    /// Reading used when no face is found or analysis fails.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            rating: Rating::NEUTRAL,
            dominant_emotion: Emotion::Unknown,
            scores: EmotionScores::from([(Emotion::Neutral, 100)]),
        }
    }
}

/// Decode a frame sent as a `data:` URL or bare base64 into grayscale.
///
/// # Errors
///
/// Returns an error if the payload is empty, not base64, or not an image.
pub fn decode_frame(payload: &str) -> Result<GrayImage, EmotionError> {
    let data = payload.split_once(',').map_or(payload, |(_, data)| data);
    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if data.is_empty() {
        return Err(EmotionError::Empty);
    }

    let bytes = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| EmotionError::InvalidBase64(e.to_string()))?;
    decode_image(&bytes)
}

/// Decode raw image bytes (JPEG, PNG or WebP) into grayscale.
///
/// # Errors
///
/// Returns [`EmotionError::InvalidImage`] if the bytes are not a supported
/// image.
pub fn decode_image(bytes: &[u8]) -> Result<GrayImage, EmotionError> {
    if bytes.is_empty() {
        return Err(EmotionError::Empty);
    }
    let img =
        image::load_from_memory(bytes).map_err(|e| EmotionError::InvalidImage(e.to_string()))?;
    Ok(img.to_luma8())
}

/// Mean pixel value (0-255) of `region`, clipped to the frame.
///
/// Returns `None` when the clipped region is empty.
#[must_use]
pub fn mean_brightness(frame: &GrayImage, region: &FaceRegion) -> Option<f64> {
    let x_end = region.x.saturating_add(region.width).min(frame.width());
    let y_end = region.y.saturating_add(region.height).min(frame.height());
    if region.x >= x_end || region.y >= y_end {
        return None;
    }

    let mut sum: u64 = 0;
    for y in region.y..y_end {
        for x in region.x..x_end {
            sum += u64::from(frame.get_pixel(x, y).0[0]);
        }
    }
    let count = u64::from(x_end - region.x) * u64::from(y_end - region.y);

    #[allow(clippy::cast_precision_loss)] // Pixel sums stay far below 2^52
    let mean = sum as f64 / count as f64;
    Some(mean)
}

/// Map a brightness to a reading. Each threshold is exclusive.
#[must_use]
pub fn reading_for_brightness(brightness: f64) -> EmotionReading {
    use Emotion::{Angry, Happy, Neutral, Sad, Surprised};

    if brightness > 150.0 {
        EmotionReading::new(5, Happy, [(Happy, 70), (Neutral, 20), (Surprised, 10)])
    } else if brightness > 125.0 {
        EmotionReading::new(4, Neutral, [(Neutral, 60), (Happy, 30), (Surprised, 10)])
    } else if brightness > 100.0 {
        EmotionReading::new(3, Neutral, [(Neutral, 80), (Sad, 15), (Angry, 5)])
    } else if brightness > 75.0 {
        EmotionReading::new(2, Sad, [(Sad, 60), (Neutral, 30), (Angry, 10)])
    } else {
        EmotionReading::new(1, Angry, [(Angry, 70), (Sad, 20), (Neutral, 10)])
    }
}

/// Analyse the largest face `detector` finds in `frame`.
///
/// Falls back to [`EmotionReading::unknown`] when there is no usable face.
#[must_use]
pub fn analyze(frame: &GrayImage, detector: &dyn FaceDetector) -> EmotionReading {
    let faces = detector.detect(frame);
    let Some(largest) = faces
        .iter()
        .enumerate()
        .max_by_key(|(i, face)| (face.area(), core::cmp::Reverse(*i)))
        .map(|(_, face)| face)
    else {
        tracing::debug!("no face detected");
        return EmotionReading::unknown();
    };

    match mean_brightness(frame, largest) {
        Some(brightness) => {
            tracing::debug!(brightness, ?largest, "analysed face region");
            reading_for_brightness(brightness)
        }
        None => {
            tracing::debug!(?largest, "face region lies outside the frame");
            EmotionReading::unknown()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Luma};

    use super::*;

    fn frame(value: u8) -> GrayImage {
        GrayImage::from_pixel(8, 8, Luma([value]))
    }

    fn png_base64(img: GrayImage) -> String {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf)
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let cases = [
            (200.0, 5, Emotion::Happy),
            (150.0, 4, Emotion::Neutral),
            (125.5, 4, Emotion::Neutral),
            (125.0, 3, Emotion::Neutral),
            (100.0, 2, Emotion::Sad),
            (76.0, 2, Emotion::Sad),
            (75.0, 1, Emotion::Angry),
            (0.0, 1, Emotion::Angry),
        ];
        for (brightness, stars, emotion) in cases {
            let reading = reading_for_brightness(brightness);
            assert_eq!(reading.rating.stars(), stars, "brightness {brightness}");
            assert_eq!(reading.dominant_emotion, emotion, "brightness {brightness}");
            assert_eq!(reading.scores.values().map(|v| u32::from(*v)).sum::<u32>(), 100);
        }
    }

    #[test]
    fn test_score_tables() {
        let reading = reading_for_brightness(110.0);
        assert_eq!(
            reading.scores,
            EmotionScores::from([
                (Emotion::Neutral, 80),
                (Emotion::Sad, 15),
                (Emotion::Angry, 5),
            ])
        );
    }

    #[test]
    fn test_no_face_is_unknown() {
        let reading = analyze(&frame(200), &FixedRegions::default());
        assert_eq!(reading, EmotionReading::unknown());
        assert_eq!(reading.rating.stars(), 3);
        assert_eq!(reading.scores.get(&Emotion::Neutral), Some(&100));
    }

    #[test]
    fn test_largest_face_wins() {
        let mut img = frame(50);
        for y in 4..8 {
            for x in 4..8 {
                img.put_pixel(x, y, Luma([220]));
            }
        }
        let small_dark = FaceRegion::new(0, 0, 2, 2);
        let large_bright = FaceRegion::new(4, 4, 4, 4);
        let reading = analyze(&img, &FixedRegions(vec![small_dark, large_bright]));
        assert_eq!(reading.dominant_emotion, Emotion::Happy);
    }

    #[test]
    fn test_region_outside_frame_is_unknown() {
        let outside = FaceRegion::new(20, 20, 5, 5);
        let reading = analyze(&frame(200), &FixedRegions(vec![outside]));
        assert_eq!(reading.dominant_emotion, Emotion::Unknown);
    }

    #[test]
    fn test_region_is_clipped() {
        let img = frame(100);
        let region = FaceRegion::new(6, 6, 10, 10);
        assert_eq!(mean_brightness(&img, &region), Some(100.0));
    }

    #[test]
    fn test_decode_data_url_and_bare_base64() {
        let encoded = png_base64(frame(180));
        let bare = decode_frame(&encoded).unwrap();
        let url = decode_frame(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(bare.dimensions(), (8, 8));
        assert_eq!(bare, url);
        assert_eq!(analyze(&bare, &WholeFrame).rating.stars(), 5);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_frame("data:image/png;base64,"), Err(EmotionError::Empty));
        assert!(matches!(decode_frame("!!!"), Err(EmotionError::InvalidBase64(_))));
        assert!(matches!(
            decode_frame(&STANDARD.encode(b"not an image")),
            Err(EmotionError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_detector_boxes_are_clipped_to_the_frame() {
        assert_eq!(
            clip_box(-5, 10, 30, 20, 100, 100),
            Some(FaceRegion::new(0, 10, 25, 20))
        );
        assert_eq!(
            clip_box(90, 90, 30, 30, 100, 100),
            Some(FaceRegion::new(90, 90, 10, 10))
        );
        assert_eq!(clip_box(-40, 0, 30, 30, 100, 100), None);
        assert_eq!(clip_box(120, 0, 30, 30, 100, 100), None);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let err = SeetaFaceDetector::from_bytes(b"not a model".to_vec()).unwrap_err();
        assert!(matches!(err, EmotionError::InvalidModel(_)));
    }

    #[test]
    fn test_parse_face_region() {
        assert_eq!(
            "1, 2,30,40".parse::<FaceRegion>().unwrap(),
            FaceRegion::new(1, 2, 30, 40)
        );
        assert!("1,2,3".parse::<FaceRegion>().is_err());
        assert!("a,b,c,d".parse::<FaceRegion>().is_err());
    }
}
