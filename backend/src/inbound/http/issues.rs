//! Issue API handlers for reporters and administrators.
//!
//! ```text
//! POST  /api/v1/issues/images        (raw image body)
//! POST  /api/v1/issues               {"title":"Broken lamp","description":"..."}
//! GET   /api/v1/issues?status=pending&q=lamp&ownerId=...
//! GET   /api/v1/issues/{id}
//! PATCH /api/v1/issues/{id}/status   {"status":"in_progress","expectedVersion":1}
//! ```

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    ImageUpload, ListIssuesRequest, SubmitIssueRequest, TransitionIssueRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::dto::IssueResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_issue_id, parse_optional_status, parse_status, parse_user_id, parse_version,
    text_query,
};

const ID_FIELD: FieldName = FieldName::new("id");

/// Request body for `POST /api/v1/issues`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: String,
    /// URL returned by `POST /api/v1/issues/images`.
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl From<CreateIssueRequest> for SubmitIssueRequest {
    fn from(value: CreateIssueRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            image_ref: value.image_ref,
            lat: value.lat,
            lng: value.lng,
        }
    }
}

/// Query string for `GET /api/v1/issues`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListIssuesQuery {
    /// `pending`, `in_progress` or `resolved`.
    pub status: Option<String>,
    /// Case-insensitive substring matched against title and description.
    pub q: Option<String>,
    /// Restrict to one reporter. Reporters may only name themselves.
    pub owner_id: Option<String>,
}

/// Request body for `PATCH /api/v1/issues/{id}/status`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// Target status.
    #[schema(example = "in_progress")]
    pub status: String,
    /// Version the caller last read; a mismatch yields `409 Conflict`.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Response body for `POST /api/v1/issues/images`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_ref: String,
}

/// Upload a photo to attach to a new issue.
#[utoipa::path(
    post,
    path = "/api/v1/issues/images",
    request_body(content = Vec<u8>, content_type = "image/*"),
    responses(
        (status = 201, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "Empty, oversized or non-image body", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 503, description = "Object storage unavailable", body = ErrorSchema)
    ),
    tags = ["issues"],
    operation_id = "uploadIssueImage"
)]
#[post("/issues/images")]
pub async fn upload_image(
    auth: Authenticated,
    state: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let image = state
        .submission
        .upload_image(
            &auth.principal,
            ImageUpload {
                content_type,
                bytes: body.to_vec(),
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ImageUploadResponse {
        image_ref: image.as_ref().to_owned(),
    }))
}

/// Report a new issue. It always starts as `pending`, owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/issues",
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Issue created", body = IssueResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 503, description = "Repository unavailable", body = ErrorSchema)
    ),
    tags = ["issues"],
    operation_id = "createIssue"
)]
#[post("/issues")]
pub async fn create_issue(
    auth: Authenticated,
    state: web::Data<HttpState>,
    payload: web::Json<CreateIssueRequest>,
) -> ApiResult<HttpResponse> {
    let issue = state
        .submission
        .submit(&auth.principal, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(IssueResponse::from(&issue)))
}

/// List issues visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/issues",
    params(ListIssuesQuery),
    responses(
        (status = 200, description = "Issues", body = [IssueResponse]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Listing another reporter's issues", body = ErrorSchema),
        (status = 503, description = "Repository unavailable", body = ErrorSchema)
    ),
    tags = ["issues"],
    operation_id = "listIssues"
)]
#[get("/issues")]
pub async fn list_issues(
    auth: Authenticated,
    state: web::Data<HttpState>,
    query: web::Query<ListIssuesQuery>,
) -> ApiResult<web::Json<Vec<IssueResponse>>> {
    let ListIssuesQuery {
        status,
        q,
        owner_id,
    } = query.into_inner();
    let request = ListIssuesRequest {
        owner: owner_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_user_id(raw, FieldName::new("ownerId")))
            .transpose()?,
        status: parse_optional_status(status.as_deref(), FieldName::new("status"))?,
        text: text_query(q.as_deref()),
    };
    let issues = state.issues.list_issues(&auth.principal, request).await?;
    Ok(web::Json(issues.iter().map(IssueResponse::from).collect()))
}

/// Fetch one issue. Reporters receive 404 for issues they do not own.
#[utoipa::path(
    get,
    path = "/api/v1/issues/{id}",
    params(("id" = String, Path, description = "Issue id")),
    responses(
        (status = 200, description = "Issue", body = IssueResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["issues"],
    operation_id = "getIssue"
)]
#[get("/issues/{id}")]
pub async fn get_issue(
    auth: Authenticated,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<IssueResponse>> {
    let id = parse_issue_id(&path.into_inner(), ID_FIELD)?;
    let issue = state.issues.get_issue(&auth.principal, id).await?;
    Ok(web::Json(IssueResponse::from(&issue)))
}

/// Move an issue along its lifecycle. Administrators only.
#[utoipa::path(
    patch,
    path = "/api/v1/issues/{id}/status",
    params(("id" = String, Path, description = "Issue id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Transitioned issue", body = IssueResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification; re-read and retry", body = ErrorSchema),
        (status = 422, description = "Transition not allowed", body = ErrorSchema),
        (status = 503, description = "Repository unavailable", body = ErrorSchema)
    ),
    tags = ["issues"],
    operation_id = "transitionIssue"
)]
#[patch("/issues/{id}/status")]
pub async fn transition_issue(
    auth: Authenticated,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<TransitionRequest>,
) -> ApiResult<web::Json<IssueResponse>> {
    let TransitionRequest {
        status,
        expected_version,
    } = payload.into_inner();
    let request = TransitionIssueRequest {
        issue_id: parse_issue_id(&path.into_inner(), ID_FIELD)?,
        requested: parse_status(status.trim(), FieldName::new("status"))?,
        expected_version: expected_version
            .map(|version| parse_version(version, FieldName::new("expectedVersion")))
            .transpose()?,
    };
    let issue = state.lifecycle.transition(&auth.principal, request).await?;
    Ok(web::Json(IssueResponse::from(&issue)))
}
