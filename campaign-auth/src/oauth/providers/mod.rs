//! Provider implementations, one per supported identity vendor.

pub mod discord;
pub mod google;
