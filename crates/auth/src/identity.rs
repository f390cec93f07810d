//! Resolved identity and the capability that produces it.
//!
//! Both the console's route guard and the client's auth session go through
//! [`Identity::from_profile`], so the two call sites cannot disagree about
//! which role a profile carries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Role, RoleGrant, UserId};

/// `GET /auth/me` response body (fields the console depends on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// Authenticated console user with a single role.
///
/// Only ever built from a backend profile; there is no local constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: UserId,
    name: String,
    role: Role,
}

impl Identity {
    /// Derive the identity from a profile: the role is the first grant's role.
    ///
    /// Fails closed: an empty `roles` collection or an unknown role name is an
    /// error, which callers treat as "not authenticated".
    pub fn from_profile(profile: Profile) -> Result<Self, ResolveError> {
        let first = profile.roles.first().ok_or(ResolveError::NoRole)?;
        let role = first
            .role
            .parse::<Role>()
            .map_err(|e| ResolveError::UnknownRole(e.0))?;

        Ok(Self {
            id: profile.id,
            name: profile.name,
            role,
        })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Up to two uppercase initials for the avatar ("U" when the name is blank).
    pub fn initials(&self) -> String {
        let parts: Vec<&str> = self.name.split_whitespace().collect();
        let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
            return "U".to_string();
        };

        let mut out = String::new();
        out.extend(first.chars().next());
        if parts.len() > 1 {
            out.extend(last.chars().next());
        }
        out.to_uppercase()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("credentials rejected by the backend")]
    Unauthorized,

    #[error("profile has no role")]
    NoRole,

    #[error("profile carries unknown role '{0}'")]
    UnknownRole(String),

    #[error("identity lookup returned HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("malformed profile: {0}")]
    Malformed(String),

    #[error("identity lookup failed: {0}")]
    Transport(String),
}

/// Resolve a session token into an [`Identity`] by asking the backend.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, token: &str) -> Result<Identity, ResolveError>;
}

#[async_trait]
impl<R> IdentityResolver for std::sync::Arc<R>
where
    R: IdentityResolver + ?Sized,
{
    async fn resolve_identity(&self, token: &str) -> Result<Identity, ResolveError> {
        (**self).resolve_identity(token).await
    }
}
