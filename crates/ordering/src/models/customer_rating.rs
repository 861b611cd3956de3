//! Webcam "emotion" ratings captured at the table.

use core::fmt;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dineease_core::{CustomerRatingId, ParseEnumError, Rating, UserId};

/// Label attached to a captured frame.
///
/// These come from a brightness heuristic, not a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Neutral,
    Surprised,
    Sad,
    Angry,
    /// No face was found or the frame could not be analysed.
    Unknown,
}

impl Emotion {
    /// Lowercase storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Surprised => "surprised",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "neutral" => Ok(Self::Neutral),
            "surprised" => Ok(Self::Surprised),
            "sad" => Ok(Self::Sad),
            "angry" => Ok(Self::Angry),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseEnumError::new("emotion", s)),
        }
    }
}

/// Percent score per emotion label. Scores sum to 100.
pub type EmotionScores = BTreeMap<Emotion, u8>;

/// A stored emotion rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRating {
    /// Unique rating ID.
    pub id: CustomerRatingId,
    /// Signed-in customer, if any.
    pub user_id: Option<UserId>,
    /// Derived 1-5 rating.
    pub rating: Rating,
    /// Highest-scoring label.
    pub dominant_emotion: Emotion,
    /// Score per label.
    pub emotion_scores: EmotionScores,
    /// Table the capture was taken at.
    pub table_number: Option<i32>,
    /// When the frame was captured.
    pub created_at: DateTime<Utc>,
}

/// A rating ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomerRating {
    /// Signed-in customer, if any.
    pub user_id: Option<UserId>,
    /// Derived 1-5 rating.
    pub rating: Rating,
    /// Highest-scoring label.
    pub dominant_emotion: Emotion,
    /// Score per label.
    pub emotion_scores: EmotionScores,
    /// Table the capture was taken at.
    pub table_number: Option<i32>,
}
