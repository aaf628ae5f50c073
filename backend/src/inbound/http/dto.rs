//! Response payloads shared by the HTTP handlers.
//!
//! Timestamps are RFC 3339 strings and ids are rendered as UUID strings so
//! the wire format does not depend on domain serde derives.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::TriageRow;
use crate::domain::{Issue, Principal, StatusCounts};

/// Public view of an authenticated principal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalResponse {
    pub id: String,
    /// `reporter` or `admin`.
    #[schema(example = "reporter")]
    pub role: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id().to_string(),
            role: principal.role().as_str().to_owned(),
            display_name: principal.display_name().to_string(),
            email: principal.email().to_string(),
            avatar_url: principal.avatar().map(|avatar| avatar.as_ref().to_owned()),
            phone: principal
                .contact()
                .phone
                .as_ref()
                .map(|phone| phone.as_ref().to_owned()),
            address: principal
                .contact()
                .address
                .as_ref()
                .map(|address| address.as_ref().to_owned()),
        }
    }
}

/// A reported issue.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub owner_id: String,
    /// `pending`, `in_progress` or `resolved`.
    #[schema(example = "pending")]
    pub status: String,
    pub created_at: String,
    /// Update stamp; echo it back as `expectedVersion` to guard a transition.
    pub version: u64,
}

impl From<&Issue> for IssueResponse {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id().to_string(),
            title: issue.title().to_string(),
            description: issue.description().to_string(),
            image_ref: issue.image().map(|image| image.as_ref().to_owned()),
            lat: issue.location().map(|point| point.lat()),
            lng: issue.location().map(|point| point.lng()),
            owner_id: issue.owner().to_string(),
            status: issue.status().as_str().to_owned(),
            created_at: issue.created_at().to_rfc3339(),
            version: issue.version().get(),
        }
    }
}

/// Issue labelled with its reporter, as shown on the triage listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriageRowResponse {
    #[serde(flatten)]
    pub issue: IssueResponse,
    /// Reporter display name, or `unknown` when the profile is unavailable.
    pub reporter_name: String,
    /// Reporter email, or `-` when the profile is unavailable.
    pub reporter_email: String,
}

impl From<&TriageRow> for TriageRowResponse {
    fn from(row: &TriageRow) -> Self {
        Self {
            issue: IssueResponse::from(&row.issue),
            reporter_name: row.reporter_name.clone(),
            reporter_email: row.reporter_email.clone(),
        }
    }
}

/// Dashboard totals.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCountsResponse {
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub total: usize,
}

impl From<StatusCounts> for StatusCountsResponse {
    fn from(counts: StatusCounts) -> Self {
        Self {
            pending: counts.pending,
            in_progress: counts.in_progress,
            resolved: counts.resolved,
            total: counts.total(),
        }
    }
}
