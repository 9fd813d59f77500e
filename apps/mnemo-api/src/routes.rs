use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use mnemo_domain::ContextDocument;
use mnemo_service::{
	ConversationRecord, Error as ServiceError, GenerationMode, IngestRequest, IngestResponse,
	PlannedContext, RetrievalRequest, ServiceStatus,
};

const DEFAULT_K: u32 = 5;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/status", get(status))
		.route("/v1/context/retrieve", post(retrieve))
		.route("/v1/context/planned", post(planned))
		.route("/v1/ingest", post(ingest))
		.route("/v1/generate", post(generate))
		.route("/v1/conversations", post(record_conversation))
		.with_state(state)
}

/// Retrieval body; every omitted knob falls back to the `[retrieval]` section.
#[derive(Debug, Deserialize)]
pub struct RetrieveBody {
	pub user_id: String,
	pub query: String,
	pub k: Option<u32>,
	pub min_similarity: Option<f32>,
	pub max_context_length: Option<usize>,
	pub recency_weight: Option<f32>,
	pub allowed_types: Option<Vec<String>>,
	pub deduplicate: Option<bool>,
	pub use_reranking: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
	pub documents: Vec<ContextDocument>,
}

#[derive(Debug, Deserialize)]
pub struct PlannedBody {
	pub user_id: String,
	pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
	pub prompt: String,
	#[serde(default)]
	pub mode: GenerationMode,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
	pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationBody {
	pub user_id: String,
	pub message: String,
	pub response: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl RetrieveBody {
	fn into_request(self, state: &AppState) -> RetrievalRequest {
		let mut req = RetrievalRequest::with_defaults(
			self.user_id,
			self.query,
			self.k.unwrap_or(DEFAULT_K),
			&state.service.cfg.retrieval,
		);

		if let Some(min_similarity) = self.min_similarity {
			req.min_similarity = min_similarity;
		}
		if let Some(max_context_length) = self.max_context_length {
			req.max_context_length = max_context_length;
		}
		if let Some(recency_weight) = self.recency_weight {
			req.recency_weight = recency_weight;
		}
		if let Some(deduplicate) = self.deduplicate {
			req.deduplicate = deduplicate;
		}
		if let Some(use_reranking) = self.use_reranking {
			req.use_reranking = use_reranking;
		}

		req.allowed_types = self.allowed_types;

		req
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self { status: StatusCode::BAD_REQUEST, error_code: "invalid_request", message },
			ServiceError::Provider { message } =>
				Self { status: StatusCode::BAD_GATEWAY, error_code: "provider_error", message },
			ServiceError::Storage { message } => Self {
				status: StatusCode::SERVICE_UNAVAILABLE,
				error_code: "storage_unavailable",
				message,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::warn!(
				status = self.status.as_u16(),
				error_code = self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
	Json(state.service.status())
}

async fn retrieve(
	State(state): State<AppState>,
	Json(payload): Json<RetrieveBody>,
) -> Result<Json<RetrieveResponse>, ApiError> {
	let req = payload.into_request(&state);
	let documents = state.service.retrieve_context(&req).await?;

	Ok(Json(RetrieveResponse { documents }))
}

async fn planned(
	State(state): State<AppState>,
	Json(payload): Json<PlannedBody>,
) -> Result<Json<PlannedContext>, ApiError> {
	let response = state.service.retrieve_planned(&payload.user_id, &payload.query).await?;

	Ok(Json(response))
}

async fn ingest(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
	let response = state.service.ingest(payload).await?;

	Ok(Json(response))
}

async fn generate(
	State(state): State<AppState>,
	Json(payload): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ApiError> {
	let text = state.service.generate(&payload.prompt, payload.mode).await?;

	Ok(Json(GenerateResponse { text }))
}

async fn record_conversation(
	State(state): State<AppState>,
	Json(payload): Json<ConversationBody>,
) -> Result<Json<ConversationRecord>, ApiError> {
	let record = state
		.service
		.record_conversation(&payload.user_id, &payload.message, &payload.response)
		.await?;

	Ok(Json(record))
}
