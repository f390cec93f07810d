//! Session token conventions shared by every component that reads or writes it.

use chrono::Duration;

/// Storage key of the client-visible token; also the name of the session cookie.
pub const SESSION_TOKEN_KEY: &str = "tutaller_token";

/// Request header carrying the role resolved by the route guard.
pub const ROLE_HEADER: &str = "x-user-role";

/// Lifetime of a persisted token.
pub fn token_ttl() -> Duration {
    Duration::days(7)
}
