//! Issue submission handler and photo upload.
//!
//! Every field is validated before any side effect, so a rejected form never
//! leaves a partial record. A photo uploaded through [`IssueSubmission::upload_image`]
//! is stored independently; if the follow-up submission never arrives the
//! object is orphaned and left for out-of-band cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::authorization::{Capability, require};
use super::ports::{
    ImageUpload, IssueRepository, IssueSubmission, ObjectStorage, ObjectStorageError,
    SubmitIssueRequest,
};
use super::repository_errors::map_issue_repository_error;
use super::{
    Error, GeoPoint, ImageRef, Issue, IssueDescription, IssueTitle, IssueValidationError,
    NewIssue, Principal,
};

/// Largest accepted photo, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Object key prefix for issue photos.
pub const IMAGE_KEY_PREFIX: &str = "problems";

fn validation_error(error: IssueValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": "validation_failed",
    }))
}

/// File extension for a supported image media type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Submission service implementing [`IssueSubmission`].
#[derive(Clone)]
pub struct IssueSubmissionService<R, S> {
    issues: Arc<R>,
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    default_location: GeoPoint,
}

impl<R, S> IssueSubmissionService<R, S> {
    /// `default_location` is used when a submission carries no coordinates.
    pub fn new(
        issues: Arc<R>,
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
        default_location: GeoPoint,
    ) -> Self {
        Self {
            issues,
            storage,
            clock,
            default_location,
        }
    }

    fn draft(
        &self,
        principal: &Principal,
        request: SubmitIssueRequest,
    ) -> Result<NewIssue, IssueValidationError> {
        let SubmitIssueRequest {
            title,
            description,
            image_ref,
            lat,
            lng,
        } = request;
        let title = IssueTitle::new(title)?;
        let description = IssueDescription::new(description)?;
        let image = image_ref
            .filter(|value| !value.trim().is_empty())
            .map(ImageRef::new)
            .transpose()?;
        let location = GeoPoint::from_optional(lat, lng)?.unwrap_or(self.default_location);
        Ok(NewIssue {
            title,
            description,
            image,
            location: Some(location),
            owner: principal.id().clone(),
            created_at: self.clock.utc(),
        })
    }
}

#[async_trait]
impl<R, S> IssueSubmission for IssueSubmissionService<R, S>
where
    R: IssueRepository,
    S: ObjectStorage,
{
    async fn submit(
        &self,
        principal: &Principal,
        request: SubmitIssueRequest,
    ) -> Result<Issue, Error> {
        require(principal, Capability::SubmitIssue)?;
        let draft = self.draft(principal, request).map_err(|err| {
            warn!(principal_id = %principal.id(), field = err.field(), "issue submission rejected");
            validation_error(err)
        })?;

        let created = self
            .issues
            .create(&Issue::open(draft))
            .await
            .map_err(map_issue_repository_error)?;
        info!(
            issue_id = %created.id(),
            owner_id = %created.owner(),
            "issue submitted"
        );
        Ok(created)
    }

    async fn upload_image(
        &self,
        principal: &Principal,
        upload: ImageUpload,
    ) -> Result<ImageRef, Error> {
        require(principal, Capability::SubmitIssue)?;
        let ImageUpload {
            content_type,
            bytes,
        } = upload;
        let extension = image_extension(&content_type).ok_or_else(|| {
            Error::invalid_request(format!("unsupported image type `{content_type}`"))
                .with_details(json!({ "field": "contentType", "code": "unsupported_media_type" }))
        })?;
        if bytes.is_empty() {
            return Err(Error::invalid_request("image body must not be empty")
                .with_details(json!({ "field": "body", "code": "empty_image" })));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::invalid_request(format!(
                "image must be at most {MAX_IMAGE_BYTES} bytes"
            ))
            .with_details(json!({
                "field": "body",
                "code": "image_too_large",
                "limit": MAX_IMAGE_BYTES,
            })));
        }

        let key = format!(
            "{IMAGE_KEY_PREFIX}/{}-{}.{extension}",
            self.clock.utc().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let size = bytes.len();
        let url = self.storage.put(&key, bytes).await.map_err(|err| match err {
            ObjectStorageError::Unavailable { message } => {
                Error::service_unavailable(format!("object storage unavailable: {message}"))
            }
            other @ ObjectStorageError::InvalidKey { .. } => {
                Error::internal(format!("object storage rejected upload: {other}"))
            }
        })?;
        info!(principal_id = %principal.id(), key = %key, size, "issue image stored");
        ImageRef::new(url).map_err(|err| Error::internal(format!("storage returned bad url: {err}")))
    }
}

#[cfg(test)]
#[path = "submission_tests.rs"]
mod tests;
