use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::cli::{ReviewSort, StoreArgs};
use crate::model::Review;

pub mod play;

pub const MAX_REVIEWS: usize = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("app not found: {app_id}")]
    NotFound { app_id: String },

    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDetails {
    pub app_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQuery {
    pub lang: String,
    pub country: String,
    pub sort: ReviewSort,
    pub count: usize,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub continuation_token: Option<String>,
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn app_details(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
    ) -> Result<AppDetails, StoreError>;

    async fn reviews_page(
        &self,
        app_id: &str,
        query: &ReviewQuery,
    ) -> Result<ReviewPage, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub lang: String,
    pub country: String,
    pub sort: ReviewSort,
    pub limit: usize,
    pub page_size: usize,
}

impl From<&StoreArgs> for FetchOptions {
    fn from(args: &StoreArgs) -> Self {
        Self {
            lang: args.lang.clone(),
            country: args.country.clone(),
            sort: args.sort,
            limit: args.review_limit.clamp(1, MAX_REVIEWS),
            page_size: args.page_size,
        }
    }
}

pub async fn fetch_reviews(
    source: &dyn ReviewSource,
    app_id: &str,
    options: &FetchOptions,
) -> Result<Vec<Review>, StoreError> {
    let limit = options.limit.clamp(1, MAX_REVIEWS);
    let mut reviews = Vec::<Review>::new();
    let mut continuation_token: Option<String> = None;

    while reviews.len() < limit {
        let query = ReviewQuery {
            lang: options.lang.clone(),
            country: options.country.clone(),
            sort: options.sort,
            count: options.page_size.max(1),
            continuation_token: continuation_token.take(),
        };

        let page = source.reviews_page(app_id, &query).await?;
        let batch_len = page.reviews.len();
        reviews.extend(page.reviews);
        continuation_token = page.continuation_token.filter(|value| !value.is_empty());

        info!(
            app_id,
            sort = options.sort.as_str(),
            batch = batch_len,
            collected = reviews.len(),
            "fetched review page"
        );

        if continuation_token.is_none() || batch_len == 0 {
            break;
        }
    }

    reviews.truncate(limit);
    Ok(reviews)
}


#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::testing::{FakeReviewSource, page};
    use super::*;
    use crate::cli::{Cli, Commands};

    fn options(limit: usize) -> FetchOptions {
        FetchOptions {
            lang: "en".to_string(),
            country: "us".to_string(),
            sort: ReviewSort::Newest,
            limit,
            page_size: 100,
        }
    }

    #[tokio::test]
    async fn stops_once_limit_is_reached_and_truncates() {
        let source = FakeReviewSource::new(
            Some("Example"),
            vec![page(60, Some("t1")), page(60, Some("t2")), page(60, None)],
        );

        let reviews = fetch_reviews(&source, "com.example", &options(100))
            .await
            .expect("fetch should succeed");

        assert_eq!(reviews.len(), 100);
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn follows_continuation_tokens_between_pages() {
        let source = FakeReviewSource::new(
            Some("Example"),
            vec![page(10, Some("next-page")), page(5, None)],
        );

        let reviews = fetch_reviews(&source, "com.example", &options(100))
            .await
            .expect("fetch should succeed");

        assert_eq!(reviews.len(), 15);
        let queries = source.queries.lock().expect("queries lock");
        assert_eq!(queries[0].continuation_token, None);
        assert_eq!(queries[1].continuation_token.as_deref(), Some("next-page"));
        assert_eq!(queries[1].count, 100);
        assert_eq!(queries[1].sort, ReviewSort::Newest);
    }

    #[tokio::test]
    async fn stops_on_empty_page_even_with_token() {
        let source = FakeReviewSource::new(
            Some("Example"),
            vec![page(0, Some("dangling")), page(20, None)],
        );

        let reviews = fetch_reviews(&source, "com.example", &options(100))
            .await
            .expect("fetch should succeed");

        assert!(reviews.is_empty());
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn configured_limit_is_capped_at_one_hundred() {
        let cli = Cli::try_parse_from([
            "review-sentiment",
            "analyze",
            "--input",
            "com.example",
            "--review-limit",
            "250",
        ])
        .expect("analyze args should parse");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze subcommand");
        };
        let options = FetchOptions::from(&args.pipeline.store);
        assert_eq!(options.limit, MAX_REVIEWS);

        let source = FakeReviewSource::new(
            Some("Example"),
            vec![page(100, Some("t1")), page(100, Some("t2")), page(100, None)],
        );
        let reviews = fetch_reviews(&source, "com.example", &options)
            .await
            .expect("fetch should succeed");

        assert_eq!(reviews.len(), 100);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn oversized_limit_in_options_is_still_capped() {
        let source = FakeReviewSource::new(
            Some("Example"),
            vec![page(100, Some("t1")), page(100, None)],
        );

        let reviews = fetch_reviews(&source, "com.example", &options(500))
            .await
            .expect("fetch should succeed");

        assert_eq!(reviews.len(), MAX_REVIEWS);
    }

    #[tokio::test]
    async fn empty_token_counts_as_exhausted() {
        let source = FakeReviewSource::new(Some("Example"), vec![page(3, Some("")), page(3, None)]);

        let reviews = fetch_reviews(&source, "com.example", &options(100))
            .await
            .expect("fetch should succeed");

        assert_eq!(reviews.len(), 3);
        assert_eq!(source.query_count(), 1);
    }
}
