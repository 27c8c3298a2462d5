//! Administrator login for the dashboard.
//!
//! The `auth` module re-exports the `forge-auth` items that callers of the `domain`
//! crate need, so the web layer does not have to depend on `forge-auth` directly.

pub mod auth {
    pub use forge_auth::oauth::{
        MemoryStateCache, ProviderKind, RequestOrigin, StateCache, CALLBACK_PATH,
    };
    pub use forge_auth::session::{MemorySessionStore, Session, SessionStore};
}

pub mod error;
pub mod login;

pub use login::{Callback, LoginFlow, LoginRedirect, LoginSettings};
