//! Sign-in flows for students and administrators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_common::{AppError, AppResult};
use campus_store::{UserRecord, UserRepository};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use validator::Validate;

use crate::actions::Actor;
use crate::models::Role;

/// Shown when the signed-in user has no profile document.
pub const USER_DATA_MISSING: &str = "User data not found. Please contact support.";
/// Shown when a non-admin uses the admin sign-in.
pub const NOT_ADMIN: &str = "You do not have administrator privileges.";

/// Email/password form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInForm {
    /// Account email.
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    /// Account password.
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

impl SignInForm {
    /// Build a form from raw input.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Failure reported by an identity provider.
///
/// Display text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    #[error("No user found with this email.")]
    UserNotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error("Too many failed attempts. Please try again later.")]
    TooManyRequests,

    #[error("An error occurred during sign-in. Please try again.")]
    Other(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        if let ProviderError::Other(detail) = &err {
            warn!(detail = %detail, "Identity provider error");
        }
        Self::Auth(err.to_string())
    }
}

/// What an identity provider returns on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Provider user id.
    pub user_id: String,
    /// Verified email.
    pub email: String,
    /// Provider display name, if set.
    pub display_name: Option<String>,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email and password for a credential.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, ProviderError>;

    /// End the current provider session.
    async fn sign_out(&self) -> AppResult<()>;
}

/// Lookup of per-user profile documents.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// The profile for `user_id`, if one exists.
    async fn lookup(&self, user_id: &str) -> AppResult<Option<UserRecord>>;
}

#[async_trait]
impl RoleDirectory for UserRepository {
    async fn lookup(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        self.find_by_id(user_id).await
    }
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Provider user id.
    pub user_id: String,
    /// Email used to sign in.
    pub email: String,
    /// Resolved role.
    pub role: Role,
    /// Student roll number from the profile, if any.
    pub student_id: Option<String>,
    /// Name to show and to sign comments with.
    pub display_name: String,
}

impl Session {
    fn from_parts(credential: Credential, profile: Option<&UserRecord>) -> Self {
        let role = profile
            .and_then(|p| p.role.as_deref())
            .map_or(Role::Student, Role::parse);
        let display_name = profile
            .and_then(|p| p.name.clone())
            .or(credential.display_name)
            .unwrap_or_else(|| credential.email.clone());
        Self {
            user_id: credential.user_id,
            email: credential.email,
            role,
            student_id: profile.and_then(|p| p.student_id.clone()),
            display_name,
        }
    }

    /// The session as an action actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id.clone(),
            user_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

/// Outcome of an admin sign-in that got past the provider.
#[derive(Debug)]
pub enum AdminAccess {
    /// The user is an administrator.
    Granted(Session),
    /// The user is not an administrator; `sign_out` ends their session after
    /// the configured delay.
    Denied {
        /// Message to show.
        message: String,
        /// Delayed sign-out task.
        sign_out: JoinHandle<()>,
    },
}

impl AdminAccess {
    /// Collapse into a result, leaving any sign-out task running.
    pub fn into_result(self) -> AppResult<Session> {
        match self {
            Self::Granted(session) => Ok(session),
            Self::Denied { message, .. } => Err(AppError::Forbidden(message)),
        }
    }
}

/// Runs the student and admin sign-in flows.
#[derive(Clone)]
pub struct SignInService {
    provider: Arc<dyn IdentityProvider>,
    directory: Arc<dyn RoleDirectory>,
    signout_delay: Duration,
}

impl SignInService {
    /// Create a new sign-in service.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn RoleDirectory>,
        signout_delay: Duration,
    ) -> Self {
        Self {
            provider,
            directory,
            signout_delay,
        }
    }

    /// Student sign-in. A missing profile resolves to the student role.
    pub async fn sign_in_student(&self, form: &SignInForm) -> AppResult<Session> {
        form.validate()?;
        let credential = self.provider.sign_in(&form.email, &form.password).await?;
        let profile = self.directory.lookup(&credential.user_id).await?;
        let session = Session::from_parts(credential, profile.as_ref());
        info!(user_id = %session.user_id, role = %session.role, "Signed in");
        Ok(session)
    }

    /// Admin sign-in.
    ///
    /// A user without a profile is refused outright. A user whose profile
    /// role is not admin is refused and signed out after the delay.
    pub async fn sign_in_admin(&self, form: &SignInForm) -> AppResult<AdminAccess> {
        form.validate()?;
        let credential = self.provider.sign_in(&form.email, &form.password).await?;
        let Some(profile) = self.directory.lookup(&credential.user_id).await? else {
            warn!(user_id = %credential.user_id, "Admin sign-in without user profile");
            return Err(AppError::Auth(USER_DATA_MISSING.to_string()));
        };

        let session = Session::from_parts(credential, Some(&profile));
        if session.role.is_admin() {
            info!(user_id = %session.user_id, "Admin signed in");
            return Ok(AdminAccess::Granted(session));
        }

        warn!(user_id = %session.user_id, "Non-admin refused at admin sign-in");
        let provider = Arc::clone(&self.provider);
        let delay = self.signout_delay;
        let user_id = session.user_id;
        let sign_out = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = provider.sign_out().await {
                warn!(user_id = %user_id, error = %e, "Delayed sign-out failed");
            }
        });

        Ok(AdminAccess::Denied {
            message: NOT_ADMIN.to_string(),
            sign_out,
        })
    }

    /// End the provider session now.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.provider.sign_out().await
    }
}
