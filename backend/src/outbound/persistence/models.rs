//! Diesel row structs and their domain conversions.
//!
//! Rows are internal to the persistence adapter. Decoding is fallible: a row
//! written by another tool with an unknown status or broken text is reported
//! as [`IssueRowError`] or [`UserRowError`] and the adapter decides whether
//! to skip it.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AvatarRef, ContactDetails, DisplayName, EmailAddress, GeoPoint, ImageRef, Issue,
    IssueDescription, IssueId, IssueParts, IssueStatus, IssueTitle, IssueValidationError,
    IssueVersion, PhoneNumber, PostalAddress, Principal, ReporterProfile, Role,
    UnknownIssueStatus, UserId, UserValidationError,
};

use super::schema::{issues, users};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IssueRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = issues)]
pub(crate) struct NewIssueRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: Uuid,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

/// Reasons a stored row cannot become a domain [`Issue`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum IssueRowError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownIssueStatus),
    #[error(transparent)]
    Invalid(#[from] IssueValidationError),
    #[error("stored version {0} is out of range")]
    Version(i64),
}

impl<'a> NewIssueRow<'a> {
    pub(crate) fn from_issue(issue: &'a Issue) -> Result<Self, IssueRowError> {
        let version = i64::try_from(issue.version().get())
            .map_err(|_| IssueRowError::Version(i64::MAX))?;
        Ok(Self {
            id: *issue.id().as_uuid(),
            title: issue.title().as_ref(),
            description: issue.description().as_ref(),
            image_url: issue.image().map(AsRef::as_ref),
            latitude: issue.location().map(|point| point.lat()),
            longitude: issue.location().map(|point| point.lng()),
            owner_id: *issue.owner().as_uuid(),
            status: issue.status().as_str(),
            created_at: issue.created_at(),
            version,
        })
    }
}

impl TryFrom<IssueRow> for Issue {
    type Error = IssueRowError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let status: IssueStatus = row.status.parse()?;
        let version = u64::try_from(row.version)
            .ok()
            .and_then(|value| IssueVersion::new(value).ok())
            .ok_or(IssueRowError::Version(row.version))?;
        Ok(Issue::restore(IssueParts {
            id: IssueId::from_uuid(row.id),
            title: IssueTitle::new(row.title)?,
            description: IssueDescription::new(row.description)?,
            image: row.image_url.map(ImageRef::new).transpose()?,
            location: GeoPoint::from_optional(row.latitude, row.longitude)?,
            owner: UserId::from_uuid(row.owner_id),
            status,
            created_at: row.created_at,
            version,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub avatar_url: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

/// A stored user whose columns no longer pass domain validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("user {id} is corrupt: {source}")]
pub(crate) struct UserRowError {
    pub id: Uuid,
    #[source]
    pub source: UserValidationError,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn from_principal(
        principal: &'a Principal,
        password_hash: &'a str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let contact = principal.contact();
        Self {
            id: *principal.id().as_uuid(),
            email: principal.email().as_ref(),
            password_hash,
            display_name: principal.display_name().as_ref(),
            avatar_url: principal.avatar().map(AsRef::as_ref),
            phone: contact.phone.as_ref().map(|phone| phone.as_ref()),
            address: contact.address.as_ref().map(|address| address.as_ref()),
            role: principal.role().as_str(),
            created_at,
        }
    }
}

impl UserRow {
    fn invalid(&self, source: UserValidationError) -> UserRowError {
        UserRowError {
            id: self.id,
            source,
        }
    }

    pub(crate) fn to_principal(&self) -> Result<Principal, UserRowError> {
        let role: Role = self.role.parse().map_err(|err| self.invalid(err))?;
        let contact = ContactDetails {
            phone: self
                .phone
                .as_deref()
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|err| self.invalid(err))?,
            address: self
                .address
                .as_deref()
                .map(PostalAddress::new)
                .transpose()
                .map_err(|err| self.invalid(err))?,
        };
        Ok(Principal::new(
            UserId::from_uuid(self.id),
            role,
            DisplayName::new(self.display_name.as_str()).map_err(|err| self.invalid(err))?,
            EmailAddress::new(&self.email).map_err(|err| self.invalid(err))?,
            self.avatar_url
                .as_deref()
                .map(AvatarRef::new)
                .transpose()
                .map_err(|err| self.invalid(err))?,
        )
        .with_contact(contact))
    }

    pub(crate) fn to_profile(&self) -> Result<ReporterProfile, UserRowError> {
        Ok(ReporterProfile {
            id: UserId::from_uuid(self.id),
            display_name: DisplayName::new(self.display_name.as_str())
                .map_err(|err| self.invalid(err))?,
            email: EmailAddress::new(&self.email).map_err(|err| self.invalid(err))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn row() -> IssueRow {
        IssueRow {
            id: Uuid::new_v4(),
            title: "Broken streetlight".into(),
            description: "No light on 5th ave".into(),
            image_url: None,
            latitude: Some(13.7563),
            longitude: Some(100.5018),
            owner_id: Uuid::new_v4(),
            status: "in_progress".into(),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
                .single()
                .expect("timestamp"),
            version: 4,
        }
    }

    #[rstest]
    fn row_decodes_to_issue(row: IssueRow) {
        let issue = Issue::try_from(row.clone()).expect("decodes");
        assert_eq!(issue.id().as_uuid(), &row.id);
        assert_eq!(issue.status(), IssueStatus::InProgress);
        assert_eq!(issue.version().get(), 4);

        let encoded = NewIssueRow::from_issue(&issue).expect("encodes");
        assert_eq!(encoded.status, "in_progress");
        assert_eq!(encoded.version, 4);
        assert_eq!(encoded.latitude, row.latitude);
    }

    #[rstest]
    fn unknown_status_is_reported(mut row: IssueRow) {
        row.status = "archived".into();
        assert!(matches!(
            Issue::try_from(row),
            Err(IssueRowError::UnknownStatus(_))
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn non_positive_version_is_reported(mut row: IssueRow, #[case] version: i64) {
        row.version = version;
        assert_eq!(Issue::try_from(row), Err(IssueRowError::Version(version)));
    }

    #[rstest]
    fn blank_title_is_reported(mut row: IssueRow) {
        row.title = "  ".into();
        assert!(matches!(Issue::try_from(row), Err(IssueRowError::Invalid(_))));
    }

    #[fixture]
    fn user_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.org".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            display_name: "Ada Lovelace".into(),
            avatar_url: None,
            phone: Some("+44 20 7946 0018".into()),
            address: Some("1 High Street, Leeds".into()),
            role: "admin".into(),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
                .single()
                .expect("timestamp"),
        }
    }

    #[rstest]
    fn user_row_decodes_to_principal(user_row: UserRow) {
        let principal = user_row.to_principal().expect("decodes");
        assert_eq!(principal.id().as_uuid(), &user_row.id);
        assert_eq!(principal.role(), Role::Admin);
        assert_eq!(
            principal.contact().phone.as_ref().map(|phone| phone.as_ref()),
            Some("+44 20 7946 0018")
        );

        let encoded = NewUserRow::from_principal(&principal, &user_row.password_hash, user_row.created_at);
        assert_eq!(encoded.role, "admin");
        assert_eq!(encoded.email, "ada@example.org");
        assert_eq!(encoded.address, user_row.address.as_deref());
    }

    #[rstest]
    fn user_row_with_unknown_role_is_reported(mut user_row: UserRow) {
        user_row.role = "superuser".into();
        let err = user_row.to_principal().expect_err("unknown role");
        assert_eq!(err.source, UserValidationError::UnknownRole);
        assert_eq!(err.id, user_row.id);
    }

    #[rstest]
    fn profile_ignores_contact_columns(mut user_row: UserRow) {
        user_row.phone = Some("not a phone".into());
        let profile = user_row.to_profile().expect("profile");
        assert_eq!(profile.display_name.as_ref(), "Ada Lovelace");
        assert!(user_row.to_principal().is_err());
    }
}
