use domain::output_config::{NewOutput, OutputPatch};
use domain::{Id, OutputKind};
use serde::Deserialize;
use utoipa::ToSchema;

/// Which columns a kind needs:
/// - aweber: `target` (account id), `listId`, `apiKey`
/// - resend: `listId` (audience id), `apiKey`
/// - brevo: numeric `listId`, `apiKey`
/// - telegram: `target` (chat id), optional `apiKey` (bot token)
/// - webhook: `target` (http or https URL)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    #[schema(value_type = uuid::Uuid)]
    pub user_id: Id,
    pub output_kind: OutputKind,
    pub name: String,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub msg_fmt: Option<String>,
    #[serde(default)]
    pub omit_ad_tracking: bool,
}

impl From<CreateParams> for NewOutput {
    fn from(params: CreateParams) -> Self {
        NewOutput {
            user_id: params.user_id,
            output_kind: params.output_kind,
            name: params.name,
            list_id: params.list_id,
            api_key: params.api_key,
            target: params.target,
            msg_fmt: params.msg_fmt,
            omit_ad_tracking: params.omit_ad_tracking,
        }
    }
}

/// Omitted fields are kept. An empty string clears an optional column.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateParams {
    pub output_kind: Option<OutputKind>,
    pub name: Option<String>,
    pub list_id: Option<String>,
    pub api_key: Option<String>,
    pub target: Option<String>,
    pub msg_fmt: Option<String>,
    pub omit_ad_tracking: Option<bool>,
}

impl From<UpdateParams> for OutputPatch {
    fn from(params: UpdateParams) -> Self {
        OutputPatch {
            output_kind: params.output_kind,
            name: params.name,
            list_id: params.list_id,
            api_key: params.api_key,
            target: params.target,
            msg_fmt: params.msg_fmt,
            omit_ad_tracking: params.omit_ad_tracking,
        }
    }
}
