//! Administrator triage endpoints.
//!
//! ```text
//! GET /api/v1/admin/dashboard
//! GET /api/v1/admin/issues?status=pending&q=lamp
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::dto::{StatusCountsResponse, TriageRowResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_status, text_query};

/// Query string for `GET /api/v1/admin/issues`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriageQuery {
    /// Drill down into one status.
    pub status: Option<String>,
    /// Case-insensitive substring matched against title and description.
    pub q: Option<String>,
}

/// Per-status totals for the triage dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Status totals", body = StatusCountsResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 503, description = "Repository unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminDashboard"
)]
#[get("/admin/dashboard")]
pub async fn dashboard(
    auth: Authenticated,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<StatusCountsResponse>> {
    let counts = state.dashboard.status_counts(&auth.principal).await?;
    Ok(web::Json(counts.into()))
}

/// Issues labelled with reporter name and email, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/issues",
    params(TriageQuery),
    responses(
        (status = 200, description = "Triage rows", body = [TriageRowResponse]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 503, description = "Repository unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "adminIssues"
)]
#[get("/admin/issues")]
pub async fn triage_issues(
    auth: Authenticated,
    state: web::Data<HttpState>,
    query: web::Query<TriageQuery>,
) -> ApiResult<web::Json<Vec<TriageRowResponse>>> {
    let TriageQuery { status, q } = query.into_inner();
    let status = parse_optional_status(status.as_deref(), FieldName::new("status"))?;
    let rows = state
        .dashboard
        .triage_list(&auth.principal, status, text_query(q.as_deref()))
        .await?;
    Ok(web::Json(rows.iter().map(TriageRowResponse::from).collect()))
}
