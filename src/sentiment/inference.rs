use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Classifier, ClassifierSet, ClassifyError, ModelVariant};
use crate::cli::InferenceArgs;
use crate::model::RawClassification;
use crate::util::truncate_chars;

pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_BINARY_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_THREE_CLASS_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment";
pub const DEFAULT_STAR_RATING_MODEL: &str = "nlptown/bert-base-multilingual-uncased-sentiment";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batched(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
}

pub struct InferenceClassifier {
    client: Client,
    endpoint: String,
    token: Option<String>,
    max_input_chars: usize,
}

impl InferenceClassifier {
    pub fn new(
        client: Client,
        base_url: &str,
        model_id: &str,
        token: Option<String>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/models/{}", base_url.trim_end_matches('/'), model_id),
            token,
            max_input_chars: max_input_chars.max(1),
        }
    }
}

#[async_trait]
impl Classifier for InferenceClassifier {
    async fn classify(&self, text: &str) -> Result<RawClassification, ClassifyError> {
        let payload = InferenceRequest {
            inputs: truncate_chars(text, self.max_input_chars),
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let preview = String::from_utf8_lossy(&body);
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body: truncate_chars(preview.trim(), ERROR_BODY_PREVIEW_CHARS).to_string(),
            });
        }

        parse_inference_body(&body)
    }
}

fn parse_inference_body(body: &[u8]) -> Result<RawClassification, ClassifyError> {
    let response: InferenceResponse = serde_json::from_slice(body)
        .map_err(|err| ClassifyError::Response(format!("unexpected json shape: {err}")))?;

    let candidates = match response {
        InferenceResponse::Batched(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
        InferenceResponse::Single(candidates) => candidates,
    };

    candidates
        .into_iter()
        .max_by(|left, right| left.score.total_cmp(&right.score))
        .map(|best| RawClassification {
            label: best.label,
            confidence: best.score,
        })
        .ok_or_else(|| ClassifyError::Response("no labels returned".to_string()))
}

fn resolve_model_id(variant: ModelVariant, model_id: &str) -> Result<String> {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        bail!("model id for {} must not be empty", variant.display_name());
    }
    Ok(trimmed.to_string())
}

pub fn build_classifier_set(args: &InferenceArgs, timeout: Duration) -> Result<ClassifierSet> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build inference http client")?;
    let token = args
        .inference_token
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let build = |variant: ModelVariant, model_id: &str| -> Result<Box<dyn Classifier>> {
        let model_id = resolve_model_id(variant, model_id)?;
        info!(
            model = variant.key(),
            model_id = %model_id,
            base_url = %args.inference_base_url,
            "registered classifier"
        );
        let classifier: Box<dyn Classifier> = Box::new(InferenceClassifier::new(
            client.clone(),
            &args.inference_base_url,
            &model_id,
            token.clone(),
            args.max_input_chars,
        ));
        Ok(classifier)
    };

    Ok(ClassifierSet::new(
        build(ModelVariant::Binary, &args.binary_model)?,
        build(ModelVariant::ThreeClass, &args.three_class_model)?,
        build(ModelVariant::StarRating, &args.star_rating_model)?,
    ))
}
