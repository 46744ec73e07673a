use crate::model::{SentimentCategory, SentimentTier};

const VERY_POSITIVE: SentimentCategory = SentimentCategory {
    category: SentimentTier::VeryPositive,
    color: "#22c55e",
    emoji: "😊",
    description: "Overwhelmingly positive sentiment",
};

const MILDLY_POSITIVE: SentimentCategory = SentimentCategory {
    category: SentimentTier::MildlyPositive,
    color: "#4ade80",
    emoji: "🙂",
    description: "Generally positive sentiment",
};

const NEUTRAL: SentimentCategory = SentimentCategory {
    category: SentimentTier::Neutral,
    color: "#eab308",
    emoji: "😐",
    description: "Mixed or neutral sentiment",
};

const MILDLY_NEGATIVE: SentimentCategory = SentimentCategory {
    category: SentimentTier::MildlyNegative,
    color: "#f87171",
    emoji: "🙁",
    description: "Generally negative sentiment",
};

const VERY_NEGATIVE: SentimentCategory = SentimentCategory {
    category: SentimentTier::VeryNegative,
    color: "#ef4444",
    emoji: "😞",
    description: "Overwhelmingly negative sentiment",
};

/// Buckets a normalized score into its tier. Bins are closed below and open
/// above, except the top bin which includes 1.0.
pub fn categorize(score: f64) -> SentimentCategory {
    if score >= 0.8 {
        VERY_POSITIVE
    } else if score >= 0.6 {
        MILDLY_POSITIVE
    } else if score >= 0.4 {
        NEUTRAL
    } else if score >= 0.2 {
        MILDLY_NEGATIVE
    } else {
        VERY_NEGATIVE
    }
}
