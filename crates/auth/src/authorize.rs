//! Path-level access policy of the console.
//!
//! Both tables are fixed at build time; there is no runtime configuration.
//!
//! - No IO
//! - No panics

use thiserror::Error;

use crate::Role;

/// Paths served without a session (exact match or `path + "/"` prefix).
pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/_next",
    "/favicon.ico",
    "/robots.txt",
    "/sitemap.xml",
    "/api",
    "/images",
    "/docs",
    "/video",
    "/health",
];

/// A path prefix restricted to a set of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub allowed: &'static [Role],
}

impl RouteRule {
    /// Raw prefix match: `/superadmin-x` is governed by the `/superadmin` rule.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(self.prefix)
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Role restrictions by prefix. Paths matching none are open to any
/// authenticated identity.
pub const ROUTE_RULES: &[RouteRule] = &[
    RouteRule {
        prefix: "/superadmin",
        allowed: &[Role::SuperAdmin],
    },
    RouteRule {
        prefix: "/workshop",
        allowed: &[Role::SuperAdmin, Role::WorkshopAdmin],
    },
    RouteRule {
        prefix: "/mechanics",
        allowed: &[Role::WorkshopAdmin, Role::Mechanic],
    },
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role '{role}' may not access '{prefix}'")]
    Forbidden { role: Role, prefix: &'static str },
}

/// Whether `path` can be served without a session.
///
/// Besides [`PUBLIC_PATHS`], any path whose last segment has a file extension
/// is treated as a static asset.
pub fn is_public_path(path: &str) -> bool {
    let listed = PUBLIC_PATHS.iter().any(|p| {
        path == *p
            || path
                .strip_prefix(p)
                .is_some_and(|rest| rest.starts_with('/'))
    });

    listed || is_static_asset(path)
}

fn is_static_asset(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
}

/// The rule governing `path`, if any.
pub fn rule_for(path: &str) -> Option<&'static RouteRule> {
    ROUTE_RULES.iter().find(|rule| rule.matches(path))
}

/// Check that `role` may view `path`.
pub fn authorize_path(path: &str, role: Role) -> Result<(), AuthzError> {
    match rule_for(path) {
        Some(rule) if !rule.allows(role) => Err(AuthzError::Forbidden {
            role,
            prefix: rule.prefix,
        }),
        _ => Ok(()),
    }
}
