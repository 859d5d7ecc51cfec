use domain::campaign::{CampaignState, ProviderName};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Campaign an operator wants a link for.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub list_id: String,
    #[schema(value_type = String, example = "Google")]
    pub provider_name: ProviderName,
    #[serde(default)]
    pub output_ids: Vec<String>,
    /// Where visitors land after consenting. Defaults to the catch-all URL.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl From<CreateParams> for CampaignState {
    fn from(params: CreateParams) -> Self {
        CampaignState::new(
            params.list_id,
            params.provider_name,
            params.output_ids,
            params.redirect_url.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignLink {
    pub link: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntryParams {
    /// Campaign token from the link.
    pub c: Option<String>,
}

/// Campaign spelled out in the query string of a direct entry link.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DirectEntryParams {
    pub output_ids: Vec<String>,
    pub redirect_url: Option<String>,
}

impl DirectEntryParams {
    /// Parses `o=<id>` (repeatable) and `r=<url>`. Unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "o" if !value.is_empty() => params.output_ids.push(value.into_owned()),
                "r" => params.redirect_url = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}
