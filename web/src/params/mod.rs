pub(crate) mod campaign;
pub(crate) mod email_list;
pub(crate) mod output;
pub(crate) mod user;

use domain::Id;
use serde::Deserialize;
use utoipa::IntoParams;

/// Narrows an index to one operator's records. Every record is listed without it.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub(crate) struct OwnerParams {
    #[param(value_type = Option<uuid::Uuid>)]
    pub user_id: Option<Id>,
}
