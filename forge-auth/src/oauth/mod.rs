//! OAuth 2.0 login infrastructure.
//!
//! Provider registry, CSRF state handling, code exchange and identity resolution
//! for the supported Git forges.

mod exchange;
mod provider;
mod state;

pub mod identity;

pub use exchange::{CodeExchanger, OAuth2Exchanger};
pub use identity::{ForgeIdentityResolver, Identity, IdentityResolver};
pub use provider::{
    ProviderConfig, ProviderKind, ProviderSettings, RequestOrigin, CALLBACK_PATH,
};
pub use state::{IssuedState, MemoryStateCache, StateCache, StateGuard, STATE_KEY_PREFIX};
