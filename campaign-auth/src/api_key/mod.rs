//! API key authentication for output integrations.
//!
//! Provides traits and implementations for authenticating requests to mailing-list and
//! messaging services that use API keys (Resend, Brevo, AWeber, etc.).

mod auth;

pub use auth::{ApiKeyAuth, AuthMethod, ProviderAuth};
