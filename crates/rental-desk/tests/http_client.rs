use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rental_desk::workflows::verification::{
    ApiError, DeskEvent, DeskOptions, HttpVerificationApi, LandlordId, RegionId, RegionRef,
    ReviewAction, ReviewDecision, StaticToken, TenantId, TenantSelection, VerificationApi,
    VerificationDesk, VerificationId, VerificationStatus,
};
use serde_json::{json, Value};

const TOKEN: &str = "landlord-token";

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    fn push(&self, route: impl Into<String>, body: Value) {
        self.requests
            .lock()
            .expect("recorder mutex")
            .push((route.into(), body));
    }

    fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.requests.lock().expect("recorder mutex"))
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Invalid token" })),
    )
        .into_response()
}

async fn regions() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "_id": "r-1", "name": "Zone A", "code": "ZA", "documentUrl": "/templates/za.pdf" },
            { "_id": "r-2", "name": "Zone B", "code": "ZB" }
        ]
    }))
}

async fn account(headers: HeaderMap, Path(id): Path<String>) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let data = if id.starts_with('l') {
        json!({
            "_id": id,
            "fullName": "Meera Rao",
            "email": "meera@example.com",
            "regionId": { "_id": "r-1", "name": "Zone A", "code": "ZA" },
            "verificationId": "v-7",
            "tenantCount": 2
        })
    } else {
        json!({
            "verificationId": id,
            "tenantId": "t1",
            "regionId": "r-1",
            "status": "verified",
            "verifiedAt": "2025-03-04T09:30:00Z"
        })
    };
    Json(json!({ "success": true, "data": data })).into_response()
}

async fn assignments(
    headers: HeaderMap,
    Path((landlord, _region)): Path<(String, String)>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if landlord == "l-broken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Region not linked" })),
        )
            .into_response();
    }
    Json(json!({
        "success": true,
        "data": [
            {
                "_id": "v-1",
                "tenantId": { "_id": "t1", "name": "Asha Menon" },
                "regionId": "r-1",
                "status": "under_review"
            },
            {
                "_id": "v-2",
                "verificationId": "ignored",
                "tenantId": "t2",
                "regionId": "r-1",
                "status": "rejected",
                "remark": "ID expired"
            }
        ]
    }))
    .into_response()
}

async fn assign(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path((landlord, region)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    recorded.push(format!("assign/{landlord}/{region}"), body);
    Json(json!({ "success": true, "message": "Assigned" })).into_response()
}

async fn send_all(
    headers: HeaderMap,
    Path((_landlord, region)): Path<(String, String)>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if region == "r-empty" {
        return Json(json!({ "success": false, "message": "No tenants in this region" }))
            .into_response();
    }
    Json(json!({ "success": true, "assignedCount": 4 })).into_response()
}

async fn tenant_documents(
    headers: HeaderMap,
    Path(tenant): Path<String>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "success": true,
        "data": [{
            "verificationId": "v-7",
            "tenantId": { "_id": tenant, "name": "Asha Menon" },
            "landlordId": { "_id": "l-1", "name": "Meera Rao" },
            "regionId": { "_id": "r-1", "name": "Zone A", "code": "ZA" },
            "status": "under_review",
            "documents": [{
                "name": "Consent form",
                "fileUrl": "uploads/regions/r-1/consent.pdf",
                "uploadedAt": "2025-03-01T10:00:00Z"
            }],
            "tenantDocuments": [{
                "name": "Aadhaar",
                "fileUrl": "https://cdn.example.com/t1/aadhaar.pdf",
                "uploadedAt": "2025-03-02T08:15:00Z",
                "uploadedBy": "Asha Menon"
            }]
        }]
    }))
    .into_response()
}

async fn review(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    recorded.push(format!("review/{id}"), body);
    Json(json!({ "success": true, "data": { "status": "rejected" } })).into_response()
}

async fn spawn_server() -> (String, Recorded) {
    let recorded = Recorded::default();
    let api = Router::new()
        .route("/regions", get(regions))
        .route("/{id}", get(account))
        .route("/assignments/{landlord}/{region}", get(assignments))
        .route("/assign/{landlord}/{region}", post(assign))
        .route("/send-all/{landlord}/{region}", post(send_all))
        .route("/tenant/{tenant}/police-verification", get(tenant_documents))
        .route("/landlord/review/{id}", patch(review))
        .with_state(recorded.clone());
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server runs");
    });

    (format!("http://{addr}/api"), recorded)
}

fn client(base_url: &str, token: StaticToken) -> HttpVerificationApi {
    HttpVerificationApi::new(base_url, Arc::new(token), Duration::from_secs(5))
        .expect("client builds")
}

#[tokio::test]
async fn regions_are_public_and_normalized() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::none());

    let regions = api.list_regions().await.expect("regions load");
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].id, RegionId::new("r-1"));
    assert_eq!(regions[0].display_name(), "Zone A (ZA)");
    assert_eq!(regions[1].document_url, None);
}

#[tokio::test]
async fn authorized_reads_carry_the_bearer_token() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));

    let landlord = api
        .fetch_landlord(&LandlordId::new("l-1"))
        .await
        .expect("landlord loads");
    assert_eq!(landlord.name, "Meera Rao");
    assert_eq!(landlord.verification_id, Some(VerificationId::new("v-7")));
    assert!(matches!(
        landlord.region,
        Some(RegionRef::Populated { ref code, .. }) if code == "ZA"
    ));

    let record = api
        .fetch_verification(&VerificationId::new("v-9"))
        .await
        .expect("record loads");
    assert_eq!(record.id, VerificationId::new("v-9"));
    assert_eq!(record.status, VerificationStatus::Verified);
}

#[tokio::test]
async fn rejected_token_maps_to_unauthenticated() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::new("expired"));

    let result = api.fetch_landlord(&LandlordId::new("l-1")).await;
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn assignment_list_prefers_record_id_over_verification_id() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));

    let records = api
        .list_assignments(&LandlordId::new("l-1"), &RegionId::new("r-1"))
        .await
        .expect("assignments load");
    let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
    assert_eq!(ids, vec!["v-1", "v-2"]);
    assert_eq!(records[0].tenant_name.as_deref(), Some("Asha Menon"));
    assert_eq!(records[1].remark.as_deref(), Some("ID expired"));
}

#[tokio::test]
async fn error_status_keeps_the_server_message() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));

    let err = api
        .list_assignments(&LandlordId::new("l-broken"), &RegionId::new("r-1"))
        .await
        .expect_err("request fails");
    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(err.server_message(), Some("Region not linked"));
}

#[tokio::test]
async fn assign_posts_tenant_ids() {
    let (base_url, recorded) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));
    let tenants = TenantSelection::new(["t1", "t2", "t1"]).expect("selection");

    api.assign(&LandlordId::new("l-1"), &RegionId::new("r-1"), &tenants)
        .await
        .expect("assign accepted");

    assert_eq!(
        recorded.take(),
        vec![(
            "assign/l-1/r-1".to_string(),
            json!({ "tenantIds": ["t1", "t2"] })
        )]
    );
}

#[tokio::test]
async fn send_all_reads_count_and_surfaces_envelope_failures() {
    let (base_url, _) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));
    let landlord = LandlordId::new("l-1");

    let count = api
        .assign_all(&landlord, &RegionId::new("r-1"))
        .await
        .expect("fan-out accepted");
    assert_eq!(count, 4);

    let err = api
        .assign_all(&landlord, &RegionId::new("r-empty"))
        .await
        .expect_err("fan-out rejected");
    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.server_message(), Some("No tenants in this region"));
}

#[tokio::test]
async fn review_patches_action_and_remark() {
    let (base_url, recorded) = spawn_server().await;
    let api = client(&base_url, StaticToken::new(TOKEN));

    let reject = ReviewDecision::new(ReviewAction::Reject, Some(" blurry scan ")).expect("valid");
    api.review(&VerificationId::new("v-7"), &reject)
        .await
        .expect("review accepted");
    api.review(&VerificationId::new("v-8"), &ReviewDecision::approve())
        .await
        .expect("review accepted");

    assert_eq!(
        recorded.take(),
        vec![
            (
                "review/v-7".to_string(),
                json!({ "action": "reject", "remark": "blurry scan" })
            ),
            ("review/v-8".to_string(), json!({ "action": "approve" })),
        ]
    );
}

#[tokio::test]
async fn desk_over_http_opens_tenant_documents() {
    let (base_url, _) = spawn_server().await;
    let api = Arc::new(client(&base_url, StaticToken::new(TOKEN)));
    let mut desk = VerificationDesk::new(api, DeskOptions::new("https://files.example.com"));

    let record = desk.tenant_documents("t1").await.expect("documents load");
    assert_eq!(record.id, VerificationId::new("v-7"));
    assert_eq!(record.tenant_id, TenantId::new("t1"));
    assert_eq!(desk.region_label(&record.region), "Zone A (ZA)");
    assert_eq!(
        desk.document_url(&record.documents[0]),
        "https://files.example.com/uploads/regions/r-1/consent.pdf"
    );
    assert_eq!(
        desk.document_url(&record.tenant_documents[0]),
        "https://cdn.example.com/t1/aadhaar.pdf"
    );
    assert!(desk.review_controls(&record).approve_enabled);
}

#[tokio::test]
async fn desk_without_token_redirects_to_login() {
    let (base_url, _) = spawn_server().await;
    let api = Arc::new(client(&base_url, StaticToken::none()));
    let mut desk = VerificationDesk::new(api, DeskOptions::new("https://files.example.com"));

    assert!(desk.open_landlord("l-1").await.is_err());
    assert!(matches!(
        desk.events(),
        [DeskEvent::LoginRedirect { .. }]
    ));
}
