//! # License API
//!
//! | Method & path | Access |
//! |---|---|
//! | `POST /v1/licenses` | public |
//! | `POST /v1/licenses/verify` | public |
//! | `GET /v1/licenses` | admin |
//! | `GET /v1/licenses/{id}` | admin |
//! | `PUT /v1/licenses/{id}/deactivate` | admin |
//! | `PUT /v1/licenses/{id}/renew` | admin |
//!
//! Soft verification failures (`not found`, `expired`, `inactive`,
//! `bound_to_another_client`) are `200 OK` with `valid: false`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use keyward_core::{ClientId, License, LicenseId, Plan, Timestamp};
use keyward_state::{validate_duration, LicenseState};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::admin_auth_middleware;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, Validate};
use crate::middleware::metrics::{record_issued, record_verification};
use crate::state::AppState;

// ─── DTOs ───────────────────────────────────────────────────────────

/// Request to issue a license.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueLicenseRequest {
    /// Plan name, 1 to 50 characters.
    pub plan: String,
    /// Validity in days from now.
    pub duration_days: i64,
}

impl Validate for IssueLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        Plan::new(self.plan.as_str()).map_err(|e| e.to_string())?;
        validate_duration(self.duration_days).map_err(|e| e.to_string())
    }
}

/// Request to verify (and on first use, bind) a license key.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyLicenseRequest {
    pub key: String,
    /// Identifier of the requesting installation.
    pub client_id: String,
}

impl Validate for VerifyLicenseRequest {
    fn validate(&self) -> Result<(), String> {
        ClientId::new(self.client_id.as_str())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// A license as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseResponse {
    pub id: Uuid,
    pub key: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    /// `null` until the first successful verification.
    pub consumer_id: Option<String>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Lifecycle state at response time: UNBOUND, ACTIVE, DEACTIVATED or EXPIRED.
    pub state: String,
}

impl LicenseResponse {
    pub fn new(license: &License, now: Timestamp) -> Self {
        Self {
            id: *license.id.as_uuid(),
            key: license.key.as_str().to_string(),
            plan: license.plan.as_str().to_string(),
            created_at: *license.created_at.as_datetime(),
            expires_at: *license.expires_at.as_datetime(),
            is_active: license.is_active,
            consumer_id: license.consumer_id.as_ref().map(|c| c.as_str().to_string()),
            consumed_at: license.consumed_at.map(|t| *t.as_datetime()),
            deactivated_at: license.deactivated_at.map(|t| *t.as_datetime()),
            state: LicenseState::of(license, now).to_string(),
        }
    }
}

/// Verification outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyLicenseResponse {
    pub valid: bool,
    /// One of `not found`, `expired`, `inactive`, `bound_to_another_client`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseResponse>,
}

// ─── Router ─────────────────────────────────────────────────────────

/// Build the licenses router. Admin handlers carry the admin auth layer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/licenses",
            post(issue_license)
                .merge(get(list_licenses).route_layer(from_fn(admin_auth_middleware))),
        )
        .route("/v1/licenses/verify", post(verify_license))
        .route(
            "/v1/licenses/{id}",
            get(get_license).route_layer(from_fn(admin_auth_middleware)),
        )
        .route(
            "/v1/licenses/{id}/deactivate",
            put(deactivate_license).route_layer(from_fn(admin_auth_middleware)),
        )
        .route(
            "/v1/licenses/{id}/renew",
            put(renew_license).route_layer(from_fn(admin_auth_middleware)),
        )
}

// ─── Handlers ───────────────────────────────────────────────────────

/// POST /v1/licenses: Issue a new, unbound license.
#[utoipa::path(
    post,
    path = "/v1/licenses",
    request_body = IssueLicenseRequest,
    responses(
        (status = 201, description = "License issued", body = LicenseResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid plan or duration", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub(crate) async fn issue_license(
    State(state): State<AppState>,
    body: Result<Json<IssueLicenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LicenseResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let license = state.engine.issue(&req.plan, req.duration_days).await?;
    record_issued();
    Ok((
        StatusCode::CREATED,
        Json(LicenseResponse::new(&license, state.engine.now())),
    ))
}

/// POST /v1/licenses/verify: Verify a key for a client, binding it on first use.
#[utoipa::path(
    post,
    path = "/v1/licenses/verify",
    request_body = VerifyLicenseRequest,
    responses(
        (status = 200, description = "Verification outcome", body = VerifyLicenseResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Empty client_id", body = crate::error::ErrorBody),
    ),
    tag = "licenses"
)]
pub(crate) async fn verify_license(
    State(state): State<AppState>,
    body: Result<Json<VerifyLicenseRequest>, JsonRejection>,
) -> Result<Json<VerifyLicenseResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let outcome = state.engine.verify(&req.key, &req.client_id).await?;
    record_verification(outcome.outcome());

    let now = state.engine.now();
    Ok(Json(VerifyLicenseResponse {
        valid: outcome.is_valid(),
        reason: outcome.reason().map(|r| r.as_str().to_string()),
        license: outcome.license().map(|l| LicenseResponse::new(l, now)),
    }))
}

/// GET /v1/licenses: List all licenses in issuance order.
#[utoipa::path(
    get,
    path = "/v1/licenses",
    responses(
        (status = 200, description = "All licenses", body = Vec<LicenseResponse>),
        (status = 401, description = "Missing or invalid admin token", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "licenses"
)]
pub(crate) async fn list_licenses(
    State(state): State<AppState>,
) -> Result<Json<Vec<LicenseResponse>>, AppError> {
    let now = state.engine.now();
    let licenses = state.engine.list().await?;
    Ok(Json(
        licenses
            .iter()
            .map(|l| LicenseResponse::new(l, now))
            .collect(),
    ))
}

/// GET /v1/licenses/{id}: Fetch one license.
#[utoipa::path(
    get,
    path = "/v1/licenses/{id}",
    params(("id" = Uuid, Path, description = "License ID")),
    responses(
        (status = 200, description = "License found", body = LicenseResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "licenses"
)]
pub(crate) async fn get_license(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let id = LicenseId::from(extract_path(id)?);
    let license = state.engine.get(id).await?;
    Ok(Json(LicenseResponse::new(&license, state.engine.now())))
}

/// PUT /v1/licenses/{id}/deactivate: Deactivate a license. Idempotent.
#[utoipa::path(
    put,
    path = "/v1/licenses/{id}/deactivate",
    params(("id" = Uuid, Path, description = "License ID")),
    responses(
        (status = 200, description = "License deactivated", body = LicenseResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "licenses"
)]
pub(crate) async fn deactivate_license(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let id = LicenseId::from(extract_path(id)?);
    let license = state.engine.deactivate(id).await?;
    Ok(Json(LicenseResponse::new(&license, state.engine.now())))
}

/// PUT /v1/licenses/{id}/renew: Extend a license by the configured renewal period.
#[utoipa::path(
    put,
    path = "/v1/licenses/{id}/renew",
    params(("id" = Uuid, Path, description = "License ID")),
    responses(
        (status = 200, description = "License renewed", body = LicenseResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "licenses"
)]
pub(crate) async fn renew_license(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LicenseResponse>, AppError> {
    let id = LicenseId::from(extract_path(id)?);
    let license = state.engine.renew(id).await?;
    Ok(Json(LicenseResponse::new(&license, state.engine.now())))
}
