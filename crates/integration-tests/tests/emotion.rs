//! Rating captured frames end to end: encode, decode, detect, rate.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};

use dineease_ordering::AppError;
use dineease_ordering::models::Emotion;
use dineease_ordering::services::ratings::read_payload;
use dineease_ordering::services::{EmotionError, FaceRegion, FixedRegions, WholeFrame, emotion};

fn encode(img: DynamicImage, format: ImageFormat) -> String {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    STANDARD.encode(buf)
}

#[test]
fn test_webcam_jpeg_data_url() {
    let frame = RgbImage::from_pixel(64, 48, Rgb([230, 220, 210]));
    let payload = format!(
        "data:image/jpeg;base64,{}",
        encode(DynamicImage::ImageRgb8(frame), ImageFormat::Jpeg)
    );

    let reading = read_payload(&payload, &WholeFrame).unwrap();
    assert_eq!(reading.rating.stars(), 5);
    assert_eq!(reading.dominant_emotion, Emotion::Happy);
    assert_eq!(reading.scores.get(&Emotion::Happy), Some(&70));
}

#[test]
fn test_largest_face_decides() {
    // Dark left half, mid-grey right half.
    let mut frame = GrayImage::from_pixel(40, 20, Luma([40]));
    for y in 0..20 {
        for x in 20..40 {
            frame.put_pixel(x, y, Luma([110]));
        }
    }
    let payload = encode(DynamicImage::ImageLuma8(frame), ImageFormat::Png);

    let small_dark = FaceRegion::new(0, 0, 10, 10);
    let large_grey = FaceRegion::new(20, 0, 20, 20);
    let reading = read_payload(&payload, &FixedRegions(vec![small_dark, large_grey])).unwrap();
    assert_eq!(reading.rating.stars(), 3);
    assert_eq!(reading.dominant_emotion, Emotion::Neutral);

    let reading = read_payload(&payload, &FixedRegions(vec![small_dark])).unwrap();
    assert_eq!(reading.rating.stars(), 1);
    assert_eq!(reading.dominant_emotion, Emotion::Angry);
}

#[test]
fn test_no_face_found() {
    let payload = encode(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255]))),
        ImageFormat::Png,
    );
    let reading = read_payload(&payload, &FixedRegions::default()).unwrap();
    assert_eq!(reading, emotion::EmotionReading::unknown());
}

#[test]
fn test_corrupt_upload_is_rejected_not_rated() {
    let payload = encode(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([200]))),
        ImageFormat::Png,
    );
    let corrupt = format!("data:image/png;base64,{payload}*?");

    let err = read_payload(&corrupt, &WholeFrame).unwrap_err();
    assert!(matches!(err, AppError::Emotion(EmotionError::InvalidBase64(_))));
}

#[test]
fn test_face_region_from_command_line() {
    let region: FaceRegion = "12,8,64,64".parse().unwrap();
    assert_eq!(region.area(), 4096);
}
