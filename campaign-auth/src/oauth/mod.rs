//! OAuth 2.0 identity providers.
//!
//! A provider turns campaign state into a consent redirect and turns the vendor's callback
//! into a `NormalizedResult` carrying the visitor's display name and email address.

mod provider;

pub mod providers;

pub use provider::{NormalizedResult, OAuthClientConfig, Provider, ProviderName};
