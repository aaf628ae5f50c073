//! Development delivery for password reset links.
//!
//! Writes the link to the structured log instead of sending mail. Deployments
//! that deliver real email plug in their own [`PasswordResetNotifier`].

use async_trait::async_trait;
use tracing::info;

use crate::domain::PasswordResetGrant;
use crate::domain::ports::{PasswordResetNotifier, PasswordResetNotifierError};

/// Logs reset links built from a base URL.
#[derive(Debug, Clone)]
pub struct LogResetNotifier {
    reset_url: String,
}

impl LogResetNotifier {
    pub fn new(reset_url: impl Into<String>) -> Self {
        Self {
            reset_url: reset_url.into(),
        }
    }

    fn link_for(&self, grant: &PasswordResetGrant) -> String {
        let separator = if self.reset_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}token={}", self.reset_url, grant.token.expose())
    }
}

#[async_trait]
impl PasswordResetNotifier for LogResetNotifier {
    async fn send_reset(
        &self,
        grant: &PasswordResetGrant,
    ) -> Result<(), PasswordResetNotifierError> {
        info!(
            email = %grant.email,
            expires_at = %grant.expires_at,
            link = %self.link_for(grant),
            "password reset link issued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailAddress, PasswordResetToken};
    use chrono::Utc;
    use rstest::rstest;

    fn grant() -> PasswordResetGrant {
        PasswordResetGrant {
            token: PasswordResetToken::generate(),
            email: EmailAddress::new("reporter@example.org").expect("email"),
            expires_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("/reset-password", "/reset-password?token=")]
    #[case("https://triage.example.org/reset?lang=en", "https://triage.example.org/reset?lang=en&token=")]
    fn links_append_the_token(#[case] base: &str, #[case] prefix: &str) {
        let grant = grant();
        let link = LogResetNotifier::new(base).link_for(&grant);
        assert_eq!(link, format!("{prefix}{}", grant.token.expose()));
    }

    #[tokio::test]
    async fn delivery_always_succeeds() {
        LogResetNotifier::new("/reset-password")
            .send_reset(&grant())
            .await
            .expect("logged");
    }
}
