use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

use super::{AppDetails, ReviewPage, ReviewQuery, ReviewSource, StoreError};
use crate::model::Review;

pub const DEFAULT_STORE_BASE_URL: &str = "https://play.google.com";

const REVIEWS_RPC_ID: &str = "UsvDTd";
const RESPONSE_GUARD: &str = ")]}'";
const TITLE_SUFFIX: &str = " - Apps on Google Play";
const USER_AGENT: &str = concat!("review-sentiment/", env!("CARGO_PKG_VERSION"));

struct TitlePatterns {
    og_title: Regex,
    title_tag: Regex,
}

impl TitlePatterns {
    fn new() -> Result<Self> {
        let og_title = Regex::new(r#"<meta\s+property="og:title"\s+content="([^"]*)""#)
            .context("failed to compile og:title regex")?;
        let title_tag = Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
            .context("failed to compile title tag regex")?;
        Ok(Self {
            og_title,
            title_tag,
        })
    }

    fn app_title(&self, html: &str) -> Option<String> {
        let raw = self
            .og_title
            .captures(html)
            .or_else(|| self.title_tag.captures(html))
            .and_then(|captures| captures.get(1))
            .map(|value| decode_html_entities(value.as_str().trim()))?;

        let title = raw.strip_suffix(TITLE_SUFFIX).unwrap_or(raw.as_str()).trim();
        if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        }
    }
}

pub struct PlayStoreClient {
    client: Client,
    base_url: String,
    titles: TitlePatterns,
}

impl PlayStoreClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build store http client")?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            titles: TitlePatterns::new()?,
        })
    }

    fn details_url(&self) -> String {
        format!("{}/store/apps/details", self.base_url)
    }

    fn batch_execute_url(&self) -> String {
        format!("{}/_/PlayStoreUi/data/batchexecute", self.base_url)
    }
}

#[async_trait]
impl ReviewSource for PlayStoreClient {
    async fn app_details(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
    ) -> Result<AppDetails, StoreError> {
        let url = self.details_url();
        let response = self
            .client
            .get(&url)
            .query(&[("id", app_id), ("hl", lang), ("gl", country)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                app_id: app_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        let title = self.titles.app_title(&html).ok_or_else(|| {
            StoreError::Parse(format!("listing page for {app_id} has no title"))
        })?;

        debug!(app_id, title = %title, "resolved app listing");
        Ok(AppDetails {
            app_id: app_id.to_string(),
            title,
        })
    }

    async fn reviews_page(
        &self,
        app_id: &str,
        query: &ReviewQuery,
    ) -> Result<ReviewPage, StoreError> {
        let url = self.batch_execute_url();
        let request_body = build_reviews_request(app_id, query);
        let response = self
            .client
            .post(&url)
            .query(&[("hl", query.lang.as_str()), ("gl", query.country.as_str())])
            .form(&[("f.req", request_body)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                app_id: app_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        parse_reviews_response(&body)
    }
}

fn build_reviews_request(app_id: &str, query: &ReviewQuery) -> String {
    let token = query
        .continuation_token
        .as_deref()
        .map_or(Value::Null, |value| Value::String(value.to_string()));
    let inner = json!([
        null,
        null,
        [2, query.sort.code(), [query.count, null, token], null, []],
        [app_id, 7]
    ]);

    json!([[[REVIEWS_RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
}

fn parse_reviews_response(body: &str) -> Result<ReviewPage, StoreError> {
    let trimmed = body.trim_start();
    let payload_text = trimmed.strip_prefix(RESPONSE_GUARD).unwrap_or(trimmed);
    let envelope: Value = serde_json::from_str(payload_text.trim())
        .map_err(|err| StoreError::Parse(format!("review envelope is not json: {err}")))?;

    let Some(inner_text) = envelope.pointer("/0/2").and_then(Value::as_str) else {
        return Ok(ReviewPage::default());
    };

    let inner: Value = serde_json::from_str(inner_text)
        .map_err(|err| StoreError::Parse(format!("review payload is not json: {err}")))?;

    let reviews = inner
        .get(0)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(parse_review_entry).collect::<Vec<Review>>())
        .unwrap_or_default();

    let continuation_token = inner
        .as_array()
        .and_then(|values| values.len().checked_sub(2).and_then(|index| values.get(index)))
        .and_then(Value::as_array)
        .and_then(|values| values.last())
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    Ok(ReviewPage {
        reviews,
        continuation_token,
    })
}

fn parse_review_entry(entry: &Value) -> Review {
    Review {
        content: entry
            .get(4)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        review_id: entry.get(0).and_then(Value::as_str).map(ToOwned::to_owned),
        user_name: entry
            .pointer("/1/0")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        star_rating: entry
            .get(2)
            .and_then(Value::as_u64)
            .and_then(|value| u8::try_from(value).ok()),
        at: entry
            .pointer("/5/0")
            .and_then(Value::as_i64)
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0)),
    }
}

fn decode_html_entities(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
