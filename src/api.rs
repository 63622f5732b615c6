//! HTTP Assessment Service

use crate::features::{Factor, PatientAttributes, FEATURE_NAMES};
use crate::inference::{AssessmentResult, RiskEngine};
use crate::{EngineConfig, RiskError};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared router state
#[derive(Clone)]
pub struct AppState {
    /// Shared engine
    pub engine: Arc<RiskEngine>,
    /// Upper bound on one assessment
    pub timeout: Duration,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/model", get(model_info))
        .route("/assess", post(assess))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Start the HTTP service
pub async fn start_server(config: &EngineConfig, engine: Arc<RiskEngine>) -> Result<(), RiskError> {
    let state = AppState {
        engine,
        timeout: config.classifier_timeout(),
    };
    let app = router(state);

    tracing::info!("Risk API listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| RiskError::Config(format!("cannot bind {}: {e}", config.listen_addr)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| RiskError::Config(e.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn model_info() -> Json<ModelInfo> {
    Json(ModelInfo {
        feature_names: FEATURE_NAMES.to_vec(),
        reference_values: Factor::ALL
            .iter()
            .map(|f| ReferenceValue { factor: *f, value: f.reference_value() })
            .collect(),
    })
}

async fn assess(
    State(state): State<AppState>,
    JsonBody(attributes): JsonBody<PatientAttributes>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    attributes.check_intake()?;

    let engine = state.engine.clone();
    let task = tokio::task::spawn_blocking(move || engine.assess(&attributes));
    let result = match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(RiskError::ModelUnavailable(format!("assessment task failed: {e}")).into()),
        Err(_) => {
            return Err(RiskError::ModelUnavailable(format!(
                "classifier did not answer within {}ms",
                state.timeout.as_millis()
            ))
            .into())
        }
    };

    Ok(Json(AssessmentResponse {
        assessment_id: Uuid::new_v4(),
        assessed_at: Utc::now(),
        counterfactual_summary: result.counterfactual.map(|c| c.summary()),
        result,
    }))
}

/// Assessment envelope returned to the display layer
#[derive(Debug, Serialize, Deserialize)]
pub struct AssessmentResponse {
    /// Request identifier
    pub assessment_id: Uuid,
    /// Completion time
    pub assessed_at: DateTime<Utc>,
    /// Engine output
    pub result: AssessmentResult,
    /// Recommendation text, when a counterfactual was found
    pub counterfactual_summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    feature_names: Vec<&'static str>,
    reference_values: Vec<ReferenceValue>,
}

#[derive(Debug, Serialize)]
struct ReferenceValue {
    factor: Factor,
    value: f64,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error description
    pub error: String,
}

/// `Json` extractor whose rejections use [`ErrorBody`]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::warn!(status = %rejection.status(), "malformed request body");
                Err((rejection.status(), Json(ErrorBody { error: rejection.body_text() })))
            }
        }
    }
}

/// Maps engine errors onto HTTP responses
pub struct ApiError(RiskError);

impl From<RiskError> for ApiError {
    fn from(e: RiskError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RiskError::InvalidAttribute(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RiskError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RiskError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self.0, "assessment rejected");
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
