//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keyward License Keys",
        version = "0.1.0",
        description = "Issue license keys, bind each to the first client that verifies it, and manage their lifecycle."
    ),
    paths(
        crate::routes::licenses::issue_license,
        crate::routes::licenses::verify_license,
        crate::routes::licenses::list_licenses,
        crate::routes::licenses::get_license,
        crate::routes::licenses::deactivate_license,
        crate::routes::licenses::renew_license,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::licenses::IssueLicenseRequest,
        crate::routes::licenses::VerifyLicenseRequest,
        crate::routes::licenses::LicenseResponse,
        crate::routes::licenses::VerifyLicenseResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "licenses", description = "License issuance, verification and administration"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by admin operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
