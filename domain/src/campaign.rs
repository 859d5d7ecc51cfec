//! Campaign state carried from link issuance, through the provider redirect, to the callback.

pub use campaign_auth::oauth::ProviderName;
use serde::{Deserialize, Serialize};

use crate::error::{invalid, Error};

/// Joins output ids into one field inside tokens and cookies.
pub const OUTPUT_DELIMITER: &str = "---";

/// Everything a campaign link decides: which list to add to, which provider to
/// authenticate with, which outputs to notify and where the visitor ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub list_id: String,
    pub provider_name: ProviderName,
    pub output_ids: Vec<String>,
    pub redirect_url: String,
}

impl CampaignState {
    pub fn new(
        list_id: impl Into<String>,
        provider_name: ProviderName,
        output_ids: Vec<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            list_id: list_id.into(),
            provider_name,
            output_ids,
            redirect_url: redirect_url.into(),
        }
    }

    /// Where the visitor is sent once the callback is accepted.
    pub fn redirect_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.redirect_url.is_empty() {
            fallback
        } else {
            &self.redirect_url
        }
    }
}

/// Flattens output ids into a single field.
///
/// Ids must be non-empty, must not contain the delimiter and must not start or end with `-`.
/// Otherwise a dash next to the delimiter would shift the split point.
pub fn join_output_ids(output_ids: &[String]) -> Result<String, Error> {
    if let Some(bad) = output_ids.iter().find(|id| !is_carriable_output_id(id)) {
        return Err(invalid(&format!("output id {bad:?} cannot be carried")));
    }
    Ok(output_ids.join(OUTPUT_DELIMITER))
}

fn is_carriable_output_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(OUTPUT_DELIMITER) && !id.starts_with('-') && !id.ends_with('-')
}

/// Inverse of `join_output_ids`. An empty field is an empty sequence, never `[""]`.
pub fn split_output_ids(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(OUTPUT_DELIMITER).map(str::to_string).collect()
}
