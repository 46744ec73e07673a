use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::{error, info, warn};

use super::analyze::Analyzer;
use crate::cli::ServeArgs;
use crate::error::AnalyzeError;
use crate::model::Report;

const INTERNAL_ERROR_DETAIL: &str = "Internal server error";
const UPSTREAM_ERROR_DETAIL: &str = "App store is unavailable";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AnalyzeError::NotFound { .. } | AnalyzeError::NoReviews => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AnalyzeError::UpstreamUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, UPSTREAM_ERROR_DETAIL.to_string())
            }
            AnalyzeError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_DETAIL.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "analysis request failed");
        } else {
            warn!(kind = self.kind(), error = %self, "analysis request rejected");
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}

async fn analyze_reviews(
    State(analyzer): State<Arc<Analyzer>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Report>, AnalyzeError> {
    let report = analyzer.analyze(&request.input).await?;
    Ok(Json(report))
}

pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin.trim())
        .with_context(|| format!("invalid allowed origin: {allowed_origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn router(analyzer: Arc<Analyzer>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/analyze", post(analyze_reviews))
        .layer(cors)
        .with_state(analyzer)
}

pub fn run(args: ServeArgs) -> Result<()> {
    let runtime = super::build_runtime()?;
    runtime.block_on(serve(args))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let analyzer = Arc::new(Analyzer::from_args(&args.pipeline)?);
    let app = router(analyzer, cors_layer(&args.allowed_origin)?);

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(
        bind = %args.bind,
        allowed_origin = %args.allowed_origin,
        max_concurrency = args.pipeline.max_concurrency,
        "review sentiment service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server terminated unexpectedly")?;

    info!("review sentiment service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
