//! HTTP binding for the governance core. Transport only: handlers parse
//! input, call into `access`, and map `AccessError` kinds to status codes.
//! Every mutating call carries its actor subject explicitly in the body —
//! there is no ambient identity.

use crate::access::errors::AccessError;
use crate::access::requests::ListFilter;
use crate::access::types::Role;
use crate::access::{audit, grants, policy, requests};
use crate::settings::Settings;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/access-requests",
            post(submit_request).get(list_requests),
        )
        .route("/access-requests/{request_id}", get(get_request))
        .route("/access-requests/{request_id}/decide", post(decide_request))
        .route(
            "/access-requests/{request_id}/reconcile",
            post(reconcile_request),
        )
        .route("/grants/revoke", post(revoke_grant))
        .route("/access-check", get(access_check))
        .route("/audit", get(list_audit))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let state = AppState {
        settings: Arc::new(settings),
        db,
    };

    let addr: SocketAddr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    )
    .parse()
    .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let app = router(state);

    tracing::info!(%addr, "Access governance API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    resource_ref: String,
    requester_subject: String,
    access_level: String,
    reason: String,
}

async fn submit_request(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, AccessError> {
    let request = requests::submit(
        &state.db,
        &body.requester_subject,
        &body.resource_ref,
        &body.access_level,
        &body.reason,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    approver_subject: Option<String>,
    limit: Option<u64>,
}

async fn list_requests(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, AccessError> {
    let status = q.status.as_deref().map(str::parse).transpose()?;
    let filter = ListFilter {
        status,
        decided_by: q.approver_subject,
        limit: q.limit,
    };
    let items = requests::list(&state.db, &filter).await?;
    Ok(Json(json!({ "items": items })))
}

async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AccessError> {
    let request = requests::get(&state.db, &request_id).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
struct DecideBody {
    approver_subject: String,
    approver_role: String,
    decision: String,
    note: Option<String>,
}

async fn decide_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<DecideBody>,
) -> Result<impl IntoResponse, AccessError> {
    let request = requests::decide(
        &state.db,
        &request_id,
        &body.approver_subject,
        &body.approver_role,
        &body.decision,
        body.note.as_deref(),
    )
    .await?;
    Ok(Json(request))
}

async fn reconcile_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AccessError> {
    let grant = requests::reconcile_grant(&state.db, &request_id).await?;
    Ok(Json(grant))
}

#[derive(Debug, Deserialize)]
struct RevokeBody {
    actor_subject: String,
    actor_role: String,
    subject: String,
    resource_ref: String,
}

async fn revoke_grant(
    State(state): State<AppState>,
    Json(body): Json<RevokeBody>,
) -> Result<impl IntoResponse, AccessError> {
    let role: Role = body.actor_role.parse()?;
    if !policy::capabilities(role).can_decide {
        return Err(AccessError::Forbidden(format!(
            "role {role} may not revoke grants"
        )));
    }
    let revoked = grants::revoke(
        &state.db,
        &body.actor_subject,
        &body.subject,
        &body.resource_ref,
    )
    .await?;
    Ok(Json(json!({ "revoked": revoked })))
}

#[derive(Debug, Deserialize)]
struct AccessCheckQuery {
    subject: String,
    role: String,
    resource_ref: String,
}

async fn access_check(
    State(state): State<AppState>,
    Query(q): Query<AccessCheckQuery>,
) -> Result<impl IntoResponse, AccessError> {
    let role: Role = q.role.parse()?;
    let check = policy::can_access(&state.db, &q.subject, role, &q.resource_ref).await?;
    Ok(Json(check))
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    limit: Option<u64>,
}

async fn list_audit(
    State(state): State<AppState>,
    Query(q): Query<AuditQuery>,
) -> Result<impl IntoResponse, AccessError> {
    let items = audit::list(&state.db, q.limit).await?;
    Ok(Json(json!({ "items": items })))
}
