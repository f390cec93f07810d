//! `tutaller-auth`: authentication/authorization rules shared by the console
//! route guard and the API client.
//!
//! This crate is intentionally decoupled from HTTP: it knows the backend's
//! endpoint paths and profile shape, but performs no IO itself.

pub mod authorize;
pub mod identity;
pub mod navigation;
pub mod principal;
pub mod redirect;
pub mod roles;
pub mod session;

pub use authorize::{AuthzError, RouteRule, authorize_path, is_public_path};
pub use identity::{Identity, IdentityResolver, Profile, ResolveError};
pub use principal::{RoleGrant, TenantId, UserId};
pub use redirect::{DEFAULT_LANDING_PATH, LOGIN_PATH, is_login_surface, login_redirect};
pub use roles::{Role, UnknownRole};

/// Backend endpoints the console depends on.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const IDENTITY: &str = "/auth/me";
    pub const REFRESH: &str = "/auth/refresh";
    pub const LOGOUT: &str = "/auth/logout";
}
