//! Downstream handlers reached only after admission.
//!
//! Each route decides for itself whether an anonymous caller is acceptable.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::identity::{Identity, Principal, Role};

#[derive(Serialize)]
pub struct TierSummary {
    pub name: &'static str,
    pub window_secs: u64,
    pub max_requests: u32,
}

#[derive(Serialize)]
pub struct AdminOverview<'a> {
    pub principal: &'a Principal,
    pub tier: TierSummary,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn me(Extension(identity): Extension<Identity>) -> Response {
    match require_authenticated(&identity) {
        Ok(principal) => Json(principal).into_response(),
        Err(rejection) => rejection,
    }
}

pub async fn admin_overview(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let principal = match require_role(&identity, Role::Admin) {
        Ok(p) => p,
        Err(rejection) => return rejection,
    };

    let tier = state.controller.tier_for(&identity);
    Json(AdminOverview {
        principal,
        tier: TierSummary {
            name: tier.name,
            window_secs: tier.window.as_secs(),
            max_requests: tier.max_requests,
        },
    })
    .into_response()
}

fn require_authenticated(identity: &Identity) -> Result<&Principal, Response> {
    identity.principal().ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()
    })
}

fn require_role(identity: &Identity, role: Role) -> Result<&Principal, Response> {
    let principal = require_authenticated(identity)?;
    if principal.role != role {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": format!("{role} role required") })),
        )
            .into_response());
    }
    Ok(principal)
}
