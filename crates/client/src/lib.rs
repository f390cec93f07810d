//! `tutaller-client`
//!
//! **Responsibility:** the console's side of the backend API.
//!
//! This crate provides:
//! - An HTTP client that attaches credentials, normalizes failures and runs a
//!   one-shot refresh-and-retry on 401
//! - Persisted storage of the session token
//! - The auth session (identity cache with login/logout/refresh)
//! - A toast queue fed by the error broadcaster
//! - The HTTP implementation of the identity resolver shared with the route guard

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod navigator;
pub mod resolver;
pub mod session;
pub mod toast;

pub use config::{ClientConfig, ConfigError};
pub use credentials::{CredentialStore, CredentialStoreError, FileCredentialStore, MemoryCredentialStore};
pub use error::{ErrorCode, NormalizedError};
pub use http::{ApiClient, ApiResponse, RequestOptions, SessionEvent};
pub use navigator::{Navigator, WatchNavigator};
pub use resolver::HttpIdentityResolver;
pub use session::{AuthSession, IdentityState, LoginError, LoginForm, LoginFormError, ViewGate};
pub use toast::{Toast, ToastQueue};
