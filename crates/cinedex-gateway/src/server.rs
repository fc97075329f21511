use crate::middleware::{auth_middleware, AuthConfig};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware as axum_mw,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cinedex_core::{ChangeEvent, CinedexError, EntityType};
use cinedex_index::{HybridSearchEngine, IndexSummary, Indexer, ReindexScheduler, SearchResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Upper bound on `limit` accepted from callers.
pub const MAX_LIMIT: usize = 50;

fn default_limit() -> usize {
    5
}

/// Body of `POST /search` and `POST /hybrid-search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Results wanted per collection, capped at [`MAX_LIMIT`].
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Body of `POST /events`.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    /// Domain event name, e.g. `showtimes.created`.
    pub event: String,
    /// Primary key of the changed row.
    pub id: u64,
}

/// Response of `POST /index/{entity}`.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Points written by the rebuild.
    pub count: usize,
}

/// Shared application state.
pub struct AppState {
    /// Serves `/search` and `/hybrid-search`.
    pub engine: Arc<HybridSearchEngine>,
    /// Runs the manual `/index/*` rebuilds.
    pub indexer: Arc<Indexer>,
    /// Receives `/events` notifications.
    pub scheduler: ReindexScheduler,
}

/// Router factory for the search gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway without auth on the administrative routes.
    pub fn build(state: AppState) -> Router {
        Self::build_with_auth(state, AuthConfig::default())
    }

    /// Build the gateway; `auth` guards `/index/*` and `/events`.
    pub fn build_with_auth(state: AppState, auth: AuthConfig) -> Router {
        let state = Arc::new(state);

        let admin = Router::new()
            .route("/index/all", post(index_all_handler))
            .route("/index/{entity}", post(index_one_handler))
            .route("/events", post(event_handler))
            .route_layer(axum_mw::from_fn_with_state(Arc::new(auth), auth_middleware));

        Router::new()
            .route("/health", get(health_handler))
            .route("/search", post(search_handler))
            .route("/hybrid-search", post(hybrid_search_handler))
            .merge(admin)
            .with_state(state)
    }
}

/// Error body returned by every failing route.
struct ApiError {
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
}

impl From<CinedexError> for ApiError {
    fn from(err: CinedexError) -> Self {
        let status = match &err {
            CinedexError::Embedding(_)
            | CinedexError::VectorStore(_)
            | CinedexError::Repository(_)
            | CinedexError::Http(_) => StatusCode::BAD_GATEWAY,
            CinedexError::Config(_)
            | CinedexError::Projection(_)
            | CinedexError::Json(_)
            | CinedexError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "cinedex"}))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = req.limit.min(MAX_LIMIT);
    let response = state.engine.search(&req.query, limit).await.map_err(|e| {
        error!(error = %e, "Search failed");
        ApiError::from(e)
    })?;
    Ok(Json(response))
}

async fn hybrid_search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let limit = req.limit.min(MAX_LIMIT);
    Json(state.engine.hybrid_search(&req.query, limit).await)
}

async fn index_one_handler(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Result<Json<CountResponse>, ApiError> {
    let entity: EntityType = entity
        .parse()
        .map_err(|e: CinedexError| ApiError::bad_request(e.to_string()))?;

    info!(collection = %entity, "Manual reindex requested");
    let count = state.indexer.reset_collection(entity).await.map_err(|e| {
        error!(collection = %entity, error = %e, "Manual reindex failed");
        ApiError::from(e)
    })?;
    Ok(Json(CountResponse { count }))
}

async fn index_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndexSummary>, ApiError> {
    info!("Manual reindex of all collections requested");
    let summary = state.indexer.reindex_everything().await.map_err(|e| {
        error!(error = %e, "Manual reindex of all collections failed");
        ApiError::from(e)
    })?;
    Ok(Json(summary))
}

async fn event_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EventRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let event = ChangeEvent::from_event_name(&req.event, req.id)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    state.scheduler.handle_event(event.clone()).await.map_err(|e| {
        error!(event = %req.event, id = req.id, error = %e, "Change event failed");
        ApiError::from(e)
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "accepted": true,
            "collection": event.collection,
            "kind": event.kind,
            "id": event.entity_id,
        })),
    ))
}
