//! # campaign-auth
//!
//! Authentication and cryptography primitives for campaign links:
//! - AES-256-GCM sealing of campaign tokens and state-transfer cookies
//! - OAuth 2.0 identity providers (Google, Discord) that resolve a visitor's name and email
//! - API key authentication for downstream output integrations
//! - HTTP client building with timeout and retry middleware
//!
//! ## Architecture
//!
//! This crate has no knowledge of storage or HTTP routing. The `domain` crate builds the
//! campaign codec, the cookie state carrier and the output fan-out on top of it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use campaign_auth::{
//!     crypto::Cipher,
//!     oauth::{Provider, ProviderName},
//!     http::ClientBuilder,
//! };
//! ```

pub mod api_key;
pub mod crypto;
pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
