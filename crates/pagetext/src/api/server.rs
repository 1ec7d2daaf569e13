//! API server setup and configuration.

use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{OcrPolicy, PagePipeline, PagetextError, PipelineConfig, Result};

use super::{
    handlers::{extract_handler, health_handler, ocr_handler},
    types::{ApiState, MAX_REQUEST_BODY_BYTES},
};

/// The configuration a worker actually runs with: OCR always happens locally, so a
/// worker never delegates to itself.
pub fn worker_config(mut config: PipelineConfig) -> PipelineConfig {
    if config.ocr_policy == OcrPolicy::Remote {
        tracing::info!("Worker runs OCR locally, ignoring ocr_policy = remote");
    }
    config.ocr_policy = OcrPolicy::Local;
    config
}

/// Create the API router around an existing pipeline.
///
/// This is public to allow embedding the routes in another application, and to let
/// tests inject a pipeline with fake collaborators.
pub fn create_router(pipeline: PagePipeline) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/extract", post(extract_handler))
        .route("/ocr", post(ocr_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the API router with a pipeline built from `config` (see [`worker_config`]).
pub fn create_router_from_config(config: PipelineConfig) -> Result<Router> {
    let pipeline = PagePipeline::new(worker_config(config))?;
    Ok(create_router(pipeline))
}

/// Start the API server.
///
/// # Examples
///
/// ```no_run
/// use pagetext::{PipelineConfig, api::serve};
///
/// #[tokio::main]
/// async fn main() -> pagetext::Result<()> {
///     serve("0.0.0.0", 8000, PipelineConfig::load(None)?).await
/// }
/// ```
pub async fn serve(host: impl AsRef<str>, port: u16, config: PipelineConfig) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| PagetextError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    let app = create_router_from_config(config)?;

    tracing::info!("Starting pagetext worker on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(PagetextError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PagetextError::Other(e.to_string()))?;

    Ok(())
}
