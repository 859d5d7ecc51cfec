//! Campaign state transfer and subscriber dispatch.
//!
//! `web` only talks to this crate. Entity models are re-exported from `entity_api` so callers
//! never depend on the storage crates directly.

pub use entity::output_kind::OutputKind;
pub use entity_api::{email_lists, outputs, subscribers, users, Id};

pub mod campaign;
pub mod codec;
pub mod dispatcher;
pub mod email_list;
pub mod error;
pub mod gateway;
pub mod output;
pub mod output_config;
pub mod provider;
pub mod relay;
pub mod state_carrier;
pub mod store;
pub mod subscriber;
pub mod user;
