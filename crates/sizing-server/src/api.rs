//! HTTP API for queries, health checks and Prometheus metrics

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use sizing_lib::{
    Dataset, EngineMetrics, FilterCriteria, Overview, SavingsSummary, Statistic,
    StructuredLogger, View,
};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub metrics: EngineMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        dataset: Dataset,
        source: impl Into<String>,
        metrics: EngineMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            dataset: Arc::new(dataset),
            source: source.into(),
            loaded_at: Utc::now(),
            metrics,
            logger,
        }
    }

    fn record_query(&self, endpoint: &str, rows: usize, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.inc_queries_served(endpoint);
        self.metrics.observe_query_latency(elapsed);
        self.logger.log_query_served(endpoint, rows, elapsed);
    }
}

/// Error body returned for rejected requests
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Request rejected before any query ran
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Query string shared by the data endpoints. Lists are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub cluster: Option<String>,
    pub power_state: Option<String>,
    pub statistic: Option<String>,
    pub columns: Option<String>,
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

impl QueryParams {
    /// Build filter criteria; an unknown statistic is rejected
    pub fn criteria(&self) -> Result<FilterCriteria, ApiError> {
        let mut criteria = FilterCriteria::new();
        if let Some(clusters) = &self.cluster {
            criteria = criteria.with_clusters(split_list(clusters));
        }
        if let Some(states) = &self.power_state {
            criteria = criteria.with_power_states(split_list(states));
        }
        if let Some(columns) = &self.columns {
            criteria = criteria.with_columns(split_list(columns));
        }
        if let Some(statistic) = &self.statistic {
            let statistic = statistic
                .parse::<Statistic>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            criteria = criteria.with_statistic(statistic);
        }
        Ok(criteria)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub vm_count: usize,
    pub findings: usize,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

/// Health check; the dataset is loaded before the server starts, so a
/// running server is always healthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        vm_count: state.dataset.len(),
        findings: state.dataset.findings().len(),
        source: state.source.clone(),
        loaded_at: state.loaded_at,
    })
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    pub clusters: Vec<String>,
    pub power_states: Vec<String>,
    pub statistics: Vec<Statistic>,
}

async fn filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    let started = Instant::now();
    let response = FiltersResponse {
        clusters: state.dataset.clusters(),
        power_states: state.dataset.power_states(),
        statistics: Statistic::ALL.to_vec(),
    };
    state.record_query("filters", response.clusters.len(), started);
    Json(response)
}

#[derive(Debug, Serialize)]
pub struct VmsResponse {
    pub statistic: Statistic,
    pub count: usize,
    #[serde(flatten)]
    pub view: View,
}

async fn vms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<VmsResponse>, ApiError> {
    let started = Instant::now();
    let criteria = params.criteria()?;
    let view = state.dataset.view(&criteria);
    state.record_query("vms", view.len(), started);

    Ok(Json(VmsResponse {
        statistic: criteria.statistic,
        count: view.len(),
        view,
    }))
}

async fn overview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Overview>, ApiError> {
    let started = Instant::now();
    let criteria = params.criteria()?;
    let overview = state.dataset.overview(&criteria);
    state.record_query("overview", overview.vm_count, started);
    Ok(Json(overview))
}

async fn savings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<SavingsSummary>, ApiError> {
    let started = Instant::now();
    let criteria = params.criteria()?;
    let savings = state.dataset.savings(&criteria);
    state.record_query("savings", 1, started);
    Ok(Json(savings))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/v1/filters", get(filters))
        .route("/api/v1/vms", get(vms))
        .route("/api/v1/overview", get(overview))
        .route("/api/v1/savings", get(savings))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
