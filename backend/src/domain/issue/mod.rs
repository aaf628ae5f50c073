//! Issue aggregate: a community-reported problem tracked through triage.
//!
//! Title and description are validated newtypes so an `Issue` can never hold
//! empty text. Status changes produce a new value with a bumped
//! [`IssueVersion`]; callers persist it through a compare-and-swap.

mod filter;
mod status;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

pub use filter::{IssueFilter, TextQuery};
pub use status::{IssueStatus, UnknownIssueStatus};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 5_000;

/// Validation errors raised by the issue value objects.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueValidationError {
    InvalidId,
    EmptyTitle,
    TitleTooLong { max: usize },
    EmptyDescription,
    DescriptionTooLong { max: usize },
    EmptyImageRef,
    LatitudeOutOfRange { value: f64 },
    LongitudeOutOfRange { value: f64 },
    PartialLocation,
    InvalidVersion,
}

impl IssueValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyDescription | Self::DescriptionTooLong { .. } => "description",
            Self::EmptyImageRef => "imageRef",
            Self::LatitudeOutOfRange { .. } => "lat",
            Self::LongitudeOutOfRange { .. } | Self::PartialLocation => "lng",
            Self::InvalidVersion => "expectedVersion",
        }
    }
}

impl fmt::Display for IssueValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "issue id must be a valid UUID"),
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
            Self::EmptyImageRef => write!(f, "image reference must not be empty"),
            Self::LatitudeOutOfRange { value } => {
                write!(f, "latitude {value} is outside -90..=90")
            }
            Self::LongitudeOutOfRange { value } => {
                write!(f, "longitude {value} is outside -180..=180")
            }
            Self::PartialLocation => write!(f, "lat and lng must be supplied together"),
            Self::InvalidVersion => write!(f, "version must be at least 1"),
        }
    }
}

impl std::error::Error for IssueValidationError {}

/// Unique, immutable issue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(raw: &str) -> Result<Self, IssueValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| IssueValidationError::InvalidId)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $max:expr, $empty:ident, $too_long:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and trim the input.
            pub fn new(value: impl AsRef<str>) -> Result<Self, IssueValidationError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IssueValidationError::$empty);
                }
                if trimmed.chars().count() > $max {
                    return Err(IssueValidationError::$too_long { max: $max });
                }
                Ok(Self(trimmed.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IssueValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

bounded_text!(
    /// Short summary of the problem; never empty.
    IssueTitle,
    TITLE_MAX,
    EmptyTitle,
    TitleTooLong
);

bounded_text!(
    /// Free-text account of the problem; never empty.
    IssueDescription,
    DESCRIPTION_MAX,
    EmptyDescription,
    DescriptionTooLong
);

/// Public URL of an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl AsRef<str>) -> Result<Self, IssueValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IssueValidationError::EmptyImageRef);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        value.0
    }
}

impl TryFrom<String> for ImageRef {
    type Error = IssueValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, IssueValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(IssueValidationError::LatitudeOutOfRange { value: lat });
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(IssueValidationError::LongitudeOutOfRange { value: lng });
        }
        Ok(Self { lat, lng })
    }

    /// Build from optional request fields. Both absent yields `None`; exactly
    /// one present is an error.
    pub fn from_optional(
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<Option<Self>, IssueValidationError> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(IssueValidationError::PartialLocation),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Monotonic update stamp used for compare-and-swap writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueVersion(u64);

impl IssueVersion {
    /// Version assigned at creation.
    pub const INITIAL: IssueVersion = IssueVersion(1);

    pub fn new(value: u64) -> Result<Self, IssueValidationError> {
        if value == 0 {
            return Err(IssueValidationError::InvalidVersion);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated input for opening a new issue.
///
/// The owner is always the authenticated principal; nothing client-supplied
/// reaches this field.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub title: IssueTitle,
    pub description: IssueDescription,
    pub image: Option<ImageRef>,
    pub location: Option<GeoPoint>,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
}

/// Every stored field of an issue, used to rehydrate from persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueParts {
    pub id: IssueId,
    pub title: IssueTitle,
    pub description: IssueDescription,
    pub image: Option<ImageRef>,
    pub location: Option<GeoPoint>,
    pub owner: UserId,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
    pub version: IssueVersion,
}

/// A community-reported issue.
///
/// ## Invariants
/// - `id`, `owner` and `created_at` never change after creation.
/// - `status` only moves along [`IssueStatus::allowed_transitions`].
/// - `version` grows by one on every status change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    id: IssueId,
    title: IssueTitle,
    description: IssueDescription,
    image: Option<ImageRef>,
    location: Option<GeoPoint>,
    owner: UserId,
    status: IssueStatus,
    created_at: DateTime<Utc>,
    version: IssueVersion,
}

impl Issue {
    /// Open a new issue in the `pending` state at the initial version.
    pub fn open(draft: NewIssue) -> Self {
        let NewIssue {
            title,
            description,
            image,
            location,
            owner,
            created_at,
        } = draft;
        Self {
            id: IssueId::random(),
            title,
            description,
            image,
            location,
            owner,
            status: IssueStatus::Pending,
            created_at,
            version: IssueVersion::INITIAL,
        }
    }

    /// Rebuild a stored issue.
    pub fn restore(parts: IssueParts) -> Self {
        let IssueParts {
            id,
            title,
            description,
            image,
            location,
            owner,
            status,
            created_at,
            version,
        } = parts;
        Self {
            id,
            title,
            description,
            image,
            location,
            owner,
            status,
            created_at,
            version,
        }
    }

    pub fn id(&self) -> IssueId {
        self.id
    }

    pub fn title(&self) -> &IssueTitle {
        &self.title
    }

    pub fn description(&self) -> &IssueDescription {
        &self.description
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn status(&self) -> IssueStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> IssueVersion {
        self.version
    }

    /// Copy of this issue moved to `status` at the next version.
    ///
    /// Does not check the transition table; the lifecycle service does that
    /// before asking the repository to swap.
    #[must_use]
    pub fn with_status(&self, status: IssueStatus) -> Self {
        Self {
            status,
            version: self.version.next(),
            ..self.clone()
        }
    }
}

/// Sort newest first, breaking ties by id for a stable order.
pub fn sort_newest_first(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.0.cmp(&b.id.0))
    });
}
