use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::sentiment::inference::{
    DEFAULT_BINARY_MODEL, DEFAULT_INFERENCE_BASE_URL, DEFAULT_STAR_RATING_MODEL,
    DEFAULT_THREE_CLASS_MODEL,
};
use crate::store::play::DEFAULT_STORE_BASE_URL;

#[derive(Parser, Debug)]
#[command(
    name = "review-sentiment",
    version,
    about = "Score the sentiment of app-store reviews with pretrained classifiers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Serve(ServeArgs),
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "REVIEW_SENTIMENT_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    #[arg(
        long,
        env = "REVIEW_SENTIMENT_ALLOWED_ORIGIN",
        default_value = "http://localhost:3000"
    )]
    pub allowed_origin: String,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub input: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub inference: InferenceArgs,

    #[arg(long, env = "REVIEW_SENTIMENT_MAX_CONCURRENCY", default_value_t = 16)]
    pub max_concurrency: usize,

    #[arg(long, env = "REVIEW_SENTIMENT_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

impl PipelineArgs {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, env = "REVIEW_SENTIMENT_STORE_BASE_URL", default_value = DEFAULT_STORE_BASE_URL)]
    pub store_base_url: String,

    #[arg(long, default_value = "en")]
    pub lang: String,

    #[arg(long, default_value = "us")]
    pub country: String,

    #[arg(long, value_enum, default_value_t = ReviewSort::Newest)]
    pub sort: ReviewSort,

    #[arg(long, default_value_t = 100)]
    pub review_limit: usize,

    #[arg(long, default_value_t = 100)]
    pub page_size: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReviewSort {
    MostRelevant,
    Newest,
    Rating,
}

impl ReviewSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MostRelevant => "most_relevant",
            Self::Newest => "newest",
            Self::Rating => "rating",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::MostRelevant => 1,
            Self::Newest => 2,
            Self::Rating => 3,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InferenceArgs {
    #[arg(
        long,
        env = "REVIEW_SENTIMENT_INFERENCE_BASE_URL",
        default_value = DEFAULT_INFERENCE_BASE_URL
    )]
    pub inference_base_url: String,

    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub inference_token: Option<String>,

    #[arg(long, default_value = DEFAULT_BINARY_MODEL)]
    pub binary_model: String,

    #[arg(long, default_value = DEFAULT_THREE_CLASS_MODEL)]
    pub three_class_model: String,

    #[arg(long, default_value = DEFAULT_STAR_RATING_MODEL)]
    pub star_rating_model: String,

    #[arg(long, default_value_t = 512)]
    pub max_input_chars: usize,
}
