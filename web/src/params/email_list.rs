use domain::email_list::NewEmailList;
use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    /// Operator who will own the list.
    #[schema(value_type = uuid::Uuid)]
    pub user_id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateParams> for NewEmailList {
    fn from(params: CreateParams) -> Self {
        NewEmailList {
            user_id: params.user_id,
            name: params.name,
            description: params.description,
        }
    }
}
