use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::aggregator::Aggregator;
use crate::article::{AggregateError, AggregationResult};

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

/// Build the public router. Unknown paths fall through to the static frontend.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(news))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    provider: String,
}

async fn news(
    State(state): State<AppState>,
    Query(params): Query<NewsQuery>,
) -> Result<Json<AggregationResult>, ApiError> {
    let out = state
        .aggregator
        .aggregate(&params.q, &params.provider)
        .await?;
    Ok(Json(out))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    details: String,
}

/// HTTP face of [`AggregateError`].
pub struct ApiError(AggregateError);

impl From<AggregateError> for ApiError {
    fn from(e: AggregateError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, body) = match self.0 {
            AggregateError::Upstream {
                provider,
                status,
                detail,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: "upstream_error",
                    provider: Some(provider),
                    status: Some(status),
                    details: detail,
                },
            ),
            AggregateError::Internal { detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "internal_error",
                    provider: None,
                    status: None,
                    details: detail,
                },
            ),
        };
        (code, Json(body)).into_response()
    }
}
