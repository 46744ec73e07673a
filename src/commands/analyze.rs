use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{AnalyzeArgs, PipelineArgs};
use crate::error::AnalyzeError;
use crate::input::{extract_app_id, listing_url};
use crate::model::{ModelReport, ModelResult, Report};
use crate::sentiment::inference::build_classifier_set;
use crate::sentiment::{ClassifierSet, ModelVariant, aggregate_reviews, categorize};
use crate::store::play::PlayStoreClient;
use crate::store::{AppDetails, FetchOptions, ReviewSource, fetch_reviews};
use crate::util::{now_utc_string, write_json_pretty};

pub struct Analyzer {
    source: Box<dyn ReviewSource>,
    classifiers: ClassifierSet,
    fetch: FetchOptions,
    max_concurrency: usize,
}

impl Analyzer {
    pub fn new(
        source: Box<dyn ReviewSource>,
        classifiers: ClassifierSet,
        fetch: FetchOptions,
        max_concurrency: usize,
    ) -> Self {
        Self {
            source,
            classifiers,
            fetch,
            max_concurrency,
        }
    }

    pub fn from_args(args: &PipelineArgs) -> Result<Self> {
        let timeout = args.http_timeout();
        let source = PlayStoreClient::new(&args.store.store_base_url, timeout)?;
        let classifiers = build_classifier_set(&args.inference, timeout)?;

        Ok(Self::new(
            Box::new(source),
            classifiers,
            FetchOptions::from(&args.store),
            args.max_concurrency,
        ))
    }

    pub async fn analyze(&self, input: &str) -> Result<Report, AnalyzeError> {
        let app_id =
            extract_app_id(input).map_err(|err| AnalyzeError::Internal(format!("{err:#}")))?;
        info!(app_id = %app_id, "analysis requested");

        let details = self
            .source
            .app_details(&app_id, &self.fetch.lang, &self.fetch.country)
            .await?;

        let reviews = fetch_reviews(self.source.as_ref(), &app_id, &self.fetch).await?;
        if reviews.is_empty() {
            info!(app_id = %app_id, "no reviews available");
            return Err(AnalyzeError::NoReviews);
        }

        let results = aggregate_reviews(&self.classifiers, &reviews, self.max_concurrency).await?;
        let report = build_report(&details, reviews.len(), &results);

        for (name, model) in &report.models {
            info!(
                app_id = %report.app_name,
                model = %name,
                score = model.score,
                category = model.sentiment.category.as_str(),
                failed = model.failed_count,
                "model sentiment"
            );
        }
        info!(
            app_id = %report.app_name,
            review_count = report.review_count,
            "analysis complete"
        );
        Ok(report)
    }
}

pub fn build_report(
    details: &AppDetails,
    review_count: usize,
    results: &BTreeMap<ModelVariant, ModelResult>,
) -> Report {
    let models = results
        .iter()
        .map(|(variant, result)| {
            let report = ModelReport {
                score: result.mean_score,
                sentiment: categorize(result.mean_score),
                description: variant.description(),
                sample_count: result.sample_count,
                failed_count: result.failure_count,
            };
            (variant.display_name().to_string(), report)
        })
        .collect::<BTreeMap<String, ModelReport>>();

    Report {
        app_name: details.app_id.clone(),
        app_title: details.title.clone(),
        app_url: listing_url(&details.app_id),
        review_count,
        models,
        generated_at: now_utc_string(),
    }
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let runtime = super::build_runtime()?;
    let analyzer = Analyzer::from_args(&args.pipeline)?;
    let report = runtime
        .block_on(analyzer.analyze(&args.input))
        .with_context(|| format!("analysis failed for input: {}", args.input))?;

    if let Some(path) = &args.output {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote sentiment report");
        return Ok(());
    }

    let data = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{data}").context("failed to write report to stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ReviewSort;
    use crate::model::SentimentTier;
    use crate::sentiment::testing::uniform_set;
    use crate::store::testing::{FakeReviewSource, page};

    fn analyzer(source: FakeReviewSource, classifiers: ClassifierSet) -> Analyzer {
        Analyzer::new(
            Box::new(source),
            classifiers,
            FetchOptions {
                lang: "en".to_string(),
                country: "us".to_string(),
                sort: ReviewSort::Newest,
                limit: 100,
                page_size: 100,
            },
            8,
        )
    }

    #[tokio::test]
    async fn hundred_positive_reviews_score_very_positive() {
        let source = FakeReviewSource::new(
            Some("Example App"),
            vec![page(100, Some("more")), page(100, None)],
        );
        let analyzer = analyzer(source, uniform_set("POSITIVE", "LABEL_1", "2 stars"));

        let report = analyzer
            .analyze("https://play.google.com/store/apps/details?id=com.example.app")
            .await
            .expect("analysis should succeed");

        assert_eq!(report.app_name, "com.example.app");
        assert_eq!(report.app_title, "Example App");
        assert_eq!(
            report.app_url,
            "https://play.google.com/store/apps/details?id=com.example.app"
        );
        assert_eq!(report.review_count, 100);

        let binary = &report.models["DistilBERT"];
        assert_eq!(binary.score, 1.0);
        assert_eq!(binary.sentiment.category, SentimentTier::VeryPositive);
        assert_eq!(binary.sample_count, 100);
        assert_eq!(binary.failed_count, 0);

        assert_eq!(report.models["RoBERTa"].sentiment.category, SentimentTier::Neutral);
        assert_eq!(report.models["Multilingual BERT"].score, 0.25);
        assert_eq!(
            report.models["Multilingual BERT"].sentiment.category,
            SentimentTier::MildlyNegative
        );
    }

    #[tokio::test]
    async fn review_batches_are_capped_at_limit() {
        let source = FakeReviewSource::new(
            Some("Example App"),
            vec![page(70, Some("t1")), page(70, Some("t2"))],
        );
        let analyzer = analyzer(source, uniform_set("NEGATIVE", "LABEL_0", "1 star"));

        let report = analyzer.analyze("com.example.app").await.expect("analysis should succeed");

        assert_eq!(report.review_count, 100);
        assert!(report.models.values().all(|model| model.sample_count == 100));
        assert!(
            report
                .models
                .values()
                .all(|model| model.sentiment.category == SentimentTier::VeryNegative)
        );
    }

    #[tokio::test]
    async fn app_without_reviews_fails_with_no_reviews() {
        let source = FakeReviewSource::new(Some("Quiet App"), vec![page(0, None)]);
        let analyzer = analyzer(source, uniform_set("POSITIVE", "LABEL_2", "5 stars"));

        let err = analyzer.analyze("com.quiet.app").await.expect_err("analysis should fail");
        assert!(matches!(err, AnalyzeError::NoReviews));
    }

    #[tokio::test]
    async fn unknown_app_fails_with_not_found() {
        let source = FakeReviewSource::new(None, vec![page(10, None)]);
        let analyzer = analyzer(source, uniform_set("POSITIVE", "LABEL_2", "5 stars"));

        let err = analyzer.analyze("com.missing.app").await.expect_err("analysis should fail");
        assert!(matches!(err, AnalyzeError::NotFound { ref app_id } if app_id == "com.missing.app"));
    }

    #[test]
    fn report_serializes_models_by_display_name() {
        let details = AppDetails {
            app_id: "com.example.app".to_string(),
            title: "Example".to_string(),
        };
        let results = BTreeMap::from([(
            ModelVariant::ThreeClass,
            ModelResult {
                mean_score: 0.65,
                sample_count: 4,
                failure_count: 1,
            },
        )]);

        let value = serde_json::to_value(build_report(&details, 4, &results))
            .expect("report should serialize");

        assert_eq!(value["app_name"], "com.example.app");
        assert_eq!(value["review_count"], 4);
        let roberta = &value["models"]["RoBERTa"];
        assert_eq!(roberta["score"], 0.65);
        assert_eq!(roberta["sentiment"]["category"], "Mildly Positive");
        assert_eq!(roberta["sentiment"]["emoji"], "🙂");
        assert_eq!(
            roberta["description"],
            "Three-way sentiment analysis (positive/neutral/negative)"
        );
        assert_eq!(roberta["failed_count"], 1);
    }
}
