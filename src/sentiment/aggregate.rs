use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::{Classifier, ClassifierSet, ModelVariant, normalize_score};
use crate::error::AnalyzeError;
use crate::model::{ModelResult, Review};

pub const NEUTRAL_FALLBACK_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredReview {
    pub score: f64,
    pub failed: bool,
}

pub async fn score_review(
    variant: ModelVariant,
    classifier: &dyn Classifier,
    text: &str,
) -> ScoredReview {
    let outcome = match classifier.classify(text).await {
        Ok(raw) => normalize_score(variant, &raw),
        Err(err) => Err(err),
    };

    match outcome {
        Ok(score) => ScoredReview {
            score: score.clamp(0.0, 1.0),
            failed: false,
        },
        Err(err) => {
            warn!(
                model = variant.key(),
                error = %err,
                "classification failed, scoring review as neutral"
            );
            ScoredReview {
                score: NEUTRAL_FALLBACK_SCORE,
                failed: true,
            }
        }
    }
}

async fn aggregate_model(
    variant: ModelVariant,
    classifier: &dyn Classifier,
    reviews: &[Review],
    max_concurrency: usize,
) -> ModelResult {
    let pending = reviews
        .iter()
        .map(|review| score_review(variant, classifier, &review.content))
        .collect::<Vec<_>>();

    let scored = stream::iter(pending)
        .buffer_unordered(max_concurrency.max(1))
        .collect::<Vec<ScoredReview>>()
        .await;

    let sample_count = scored.len();
    let failure_count = scored.iter().filter(|value| value.failed).count();
    let total = scored.iter().map(|value| value.score).sum::<f64>();

    ModelResult {
        mean_score: total / sample_count as f64,
        sample_count,
        failure_count,
    }
}

pub async fn aggregate_reviews(
    classifiers: &ClassifierSet,
    reviews: &[Review],
    max_concurrency: usize,
) -> Result<BTreeMap<ModelVariant, ModelResult>, AnalyzeError> {
    if reviews.is_empty() {
        return Err(AnalyzeError::NoReviews);
    }

    let mut results = BTreeMap::new();
    for variant in ModelVariant::ALL {
        let result = aggregate_model(
            variant,
            classifiers.get(variant),
            reviews,
            max_concurrency,
        )
        .await;

        info!(
            model = variant.key(),
            mean_score = result.mean_score,
            sample_count = result.sample_count,
            failure_count = result.failure_count,
            "model aggregation complete"
        );
        results.insert(variant, result);
    }

    Ok(results)
}
