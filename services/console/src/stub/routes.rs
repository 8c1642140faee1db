use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use rental_desk::workflows::verification::wire::{
    AssignBody, Envelope, LinkRegionBody, RawRegion, RawVerificationRecord, ReviewBody,
    SendAllData,
};
use serde_json::{json, Value};
use tracing::info;

use super::infra::{Account, AppState, StubStore, STUB_LANDLORD_ID, STUB_TOKEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    Unauthorized,
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StubError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authorized".to_string()),
            StubError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            StubError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            StubError::Conflict(message) => (StatusCode::CONFLICT, message),
        };
        (status, Json(Envelope::<Value>::failure(message))).into_response()
    }
}

/// Landlord signed in through the bearer token.
pub(crate) struct SignedIn {
    landlord_id: String,
}

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = StubError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        match token {
            Some(token) if token == STUB_TOKEN => Ok(Self {
                landlord_id: STUB_LANDLORD_ID.to_string(),
            }),
            _ => Err(StubError::Unauthorized),
        }
    }
}

/// Verification API under `/api` plus the health, readiness and metrics endpoints.
///
/// `/ready` and `/metrics` expect an [`AppState`] extension layered on by the server.
pub fn stub_router(store: StubStore) -> Router {
    let api = Router::new()
        .route("/regions", get(list_regions))
        .route("/linkedLandlords", post(link_region))
        .route("/{account_id}", get(fetch_account))
        .route("/assignments/{landlord_id}/{region_id}", get(list_assignments))
        .route("/assign/{landlord_id}/{region_id}", post(assign))
        .route("/send-all/{landlord_id}/{region_id}", post(send_all))
        .route(
            "/tenant/{tenant_id}/police-verification",
            get(tenant_verifications),
        )
        .route("/landlord/review/{verification_id}", patch(review))
        .with_state(store);

    Router::new()
        .nest("/api", api)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };
    (status, Json(json!({ "status": label })))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn list_regions(State(store): State<StubStore>) -> Json<Envelope<Vec<RawRegion>>> {
    Json(Envelope::ok(store.regions()))
}

async fn link_region(
    State(store): State<StubStore>,
    signed_in: SignedIn,
    Json(body): Json<LinkRegionBody>,
) -> Result<Json<Envelope<Value>>, StubError> {
    store.link_region(&signed_in.landlord_id, &body.region_id)?;
    info!(landlord = %signed_in.landlord_id, region = %body.region_id, "stub region linked");
    Ok(Json(Envelope {
        message: Some("Region linked successfully".to_string()),
        ..Envelope::ok(json!({ "regionId": body.region_id }))
    }))
}

async fn fetch_account(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path(account_id): Path<String>,
) -> Result<Json<Envelope<Account>>, StubError> {
    Ok(Json(Envelope::ok(store.account(&account_id)?)))
}

async fn list_assignments(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path((landlord_id, region_id)): Path<(String, String)>,
) -> Json<Envelope<Vec<RawVerificationRecord>>> {
    Json(Envelope::ok(store.assignments(&landlord_id, &region_id)))
}

async fn assign(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path((landlord_id, region_id)): Path<(String, String)>,
    Json(body): Json<AssignBody>,
) -> Result<Json<Envelope<Value>>, StubError> {
    let count = store.assign(&landlord_id, &region_id, &body.tenant_ids)?;
    info!(landlord = %landlord_id, region = %region_id, count, "stub verification assigned");
    Ok(Json(Envelope {
        message: Some(format!("Verification assigned to {count} tenant(s)")),
        ..Envelope::ok(json!({ "assigned": count }))
    }))
}

async fn send_all(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path((landlord_id, region_id)): Path<(String, String)>,
) -> Result<Json<Envelope<SendAllData>>, StubError> {
    let count = store.send_all(&landlord_id, &region_id)?;
    info!(landlord = %landlord_id, region = %region_id, count, "stub verification sent to all");
    Ok(Json(Envelope {
        assigned_count: Some(count),
        ..Envelope::ok(SendAllData::default())
    }))
}

async fn tenant_verifications(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path(tenant_id): Path<String>,
) -> Json<Envelope<Vec<RawVerificationRecord>>> {
    Json(Envelope::ok(store.tenant_verifications(&tenant_id)))
}

async fn review(
    State(store): State<StubStore>,
    _signed_in: SignedIn,
    Path(verification_id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Envelope<Value>>, StubError> {
    let status = store.review(&verification_id, body.action, body.remark)?;
    info!(verification = %verification_id, %status, "stub review recorded");
    Ok(Json(Envelope::ok(json!({ "status": status }))))
}
