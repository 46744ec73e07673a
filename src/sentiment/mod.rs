use async_trait::async_trait;
use thiserror::Error;

use crate::model::RawClassification;

mod aggregate;
mod category;
pub mod inference;

pub use aggregate::aggregate_reviews;
pub use category::categorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelVariant {
    /// Two classes: `POSITIVE` / `NEGATIVE`.
    Binary,
    /// Three classes: `LABEL_0` (negative), `LABEL_1` (neutral), `LABEL_2` (positive).
    ThreeClass,
    /// Five classes: `"1 star"` through `"5 stars"`.
    StarRating,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 3] = [Self::Binary, Self::ThreeClass, Self::StarRating];

    pub fn key(self) -> &'static str {
        match self {
            Self::Binary => "distilbert",
            Self::ThreeClass => "roberta",
            Self::StarRating => "multilingual",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Binary => "DistilBERT",
            Self::ThreeClass => "RoBERTa",
            Self::StarRating => "Multilingual BERT",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Binary => "Binary sentiment analysis (positive/negative)",
            Self::ThreeClass => "Three-way sentiment analysis (positive/neutral/negative)",
            Self::StarRating => "5-star rating based sentiment analysis",
        }
    }
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable inference response: {0}")]
    Response(String),

    #[error("unrecognized label `{label}` from {model} model")]
    UnknownLabel { model: &'static str, label: String },
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<RawClassification, ClassifyError>;
}

pub struct ClassifierSet {
    binary: Box<dyn Classifier>,
    three_class: Box<dyn Classifier>,
    star_rating: Box<dyn Classifier>,
}

impl ClassifierSet {
    pub fn new(
        binary: Box<dyn Classifier>,
        three_class: Box<dyn Classifier>,
        star_rating: Box<dyn Classifier>,
    ) -> Self {
        Self {
            binary,
            three_class,
            star_rating,
        }
    }

    pub fn get(&self, variant: ModelVariant) -> &dyn Classifier {
        match variant {
            ModelVariant::Binary => self.binary.as_ref(),
            ModelVariant::ThreeClass => self.three_class.as_ref(),
            ModelVariant::StarRating => self.star_rating.as_ref(),
        }
    }
}

pub fn normalize_score(
    variant: ModelVariant,
    raw: &RawClassification,
) -> Result<f64, ClassifyError> {
    let label = raw.label.trim();

    match variant {
        ModelVariant::Binary => Ok(if label == "POSITIVE" { 1.0 } else { 0.0 }),
        ModelVariant::ThreeClass => {
            let lowered = label.to_ascii_lowercase();
            let score = match lowered.as_str() {
                "label_2" | "positive" => 1.0,
                "label_1" | "neutral" => 0.5,
                _ => 0.0,
            };
            Ok(score)
        }
        ModelVariant::StarRating => {
            let stars = label
                .split_whitespace()
                .next()
                .and_then(|value| value.parse::<u8>().ok())
                .filter(|value| (1..=5).contains(value))
                .ok_or_else(|| ClassifyError::UnknownLabel {
                    model: variant.key(),
                    label: raw.label.clone(),
                })?;
            Ok(f64::from(stars - 1) / 4.0)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str) -> RawClassification {
        RawClassification {
            label: label.to_string(),
            confidence: 0.9,
        }
    }

    fn normalized(variant: ModelVariant, label: &str) -> f64 {
        normalize_score(variant, &raw(label)).expect("label should normalize")
    }

    #[test]
    fn binary_labels_map_to_extremes() {
        assert_eq!(normalized(ModelVariant::Binary, "POSITIVE"), 1.0);
        assert_eq!(normalized(ModelVariant::Binary, "NEGATIVE"), 0.0);
    }

    #[test]
    fn three_class_labels_map_to_three_points() {
        assert_eq!(normalized(ModelVariant::ThreeClass, "LABEL_2"), 1.0);
        assert_eq!(normalized(ModelVariant::ThreeClass, "LABEL_1"), 0.5);
        assert_eq!(normalized(ModelVariant::ThreeClass, "LABEL_0"), 0.0);
    }

    #[test]
    fn three_class_accepts_named_labels() {
        assert_eq!(normalized(ModelVariant::ThreeClass, "positive"), 1.0);
        assert_eq!(normalized(ModelVariant::ThreeClass, "Neutral"), 0.5);
        assert_eq!(normalized(ModelVariant::ThreeClass, "negative"), 0.0);
    }

    #[test]
    fn star_labels_map_affinely_onto_unit_range() {
        let expected = [
            ("1 star", 0.0),
            ("2 stars", 0.25),
            ("3 stars", 0.5),
            ("4 stars", 0.75),
            ("5 stars", 1.0),
        ];
        for (label, score) in expected {
            let value = normalized(ModelVariant::StarRating, label);
            assert_eq!(value, score, "label {label}");
            assert_eq!((value * 4.0).round() as u8 + 1, label[..1].parse::<u8>().unwrap());
        }
    }

    #[test]
    fn star_labels_outside_one_to_five_are_rejected() {
        for label in ["0 stars", "6 stars", "stars", ""] {
            let err = normalize_score(ModelVariant::StarRating, &raw(label))
                .expect_err("label should be rejected");
            assert!(matches!(err, ClassifyError::UnknownLabel { model: "multilingual", .. }));
        }
    }

    #[test]
    fn variants_carry_report_metadata() {
        let names = ModelVariant::ALL.map(ModelVariant::display_name);
        assert_eq!(names, ["DistilBERT", "RoBERTa", "Multilingual BERT"]);
        assert!(ModelVariant::StarRating.description().contains("5-star"));
    }
}
