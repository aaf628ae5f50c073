//! Driving port for filing new issues and uploading their photos.

use async_trait::async_trait;

use crate::domain::{Error, ImageRef, Issue, Principal};

/// Raw issue form as received from a client. Validation happens in the
/// service so every field failure maps to one `invalid_request` error.
///
/// There is deliberately no owner field: ownership comes from the principal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitIssueRequest {
    pub title: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Photo bytes plus the declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueSubmission: Send + Sync {
    /// Validate and store a new issue owned by `principal`.
    async fn submit(&self, principal: &Principal, request: SubmitIssueRequest)
    -> Result<Issue, Error>;

    /// Store a photo and return the reference to attach to a submission.
    async fn upload_image(&self, principal: &Principal, upload: ImageUpload)
    -> Result<ImageRef, Error>;
}
