//! # forge-auth
//!
//! Authentication building blocks for logging an administrator into the dashboard
//! with an identity from a Git forge:
//! - Provider registry for GitHub, Gitee, GitLab, Jihulab and self-hosted Gitea
//! - CSRF state issuing/verification backed by a pluggable expiring cache
//! - Authorization code exchange (via the `oauth2` crate)
//! - Identity resolution against each forge's user API
//! - Admin allow-list and opaque session issuing
//!
//! ## Architecture
//!
//! This crate holds no request-handling logic. The `domain` crate sequences these
//! pieces into the login/callback flow and `web` exposes them over HTTP.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forge_auth::{
//!     oauth::{ProviderConfig, ProviderSettings, RequestOrigin, StateGuard},
//!     admin::AdminAllowList,
//!     session::Session,
//! };
//! ```

pub mod admin;
pub mod error;
pub mod http;
pub mod oauth;
pub mod random;
pub mod session;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
