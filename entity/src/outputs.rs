//! Configured downstream integrations.
//!
//! One row per output regardless of kind. Columns a kind does not use stay NULL:
//! - `list_id`: AWeber list, Resend audience or Brevo list identifier
//! - `target`: Telegram chat id or webhook URL
//! - `msg_fmt`: message template for Telegram and webhooks

use crate::output_kind::OutputKind;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::outputs::Model)]
#[sea_orm(schema_name = "campaign_relay", table_name = "outputs")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = uuid::Uuid)]
    pub user_id: Id,
    pub output_kind: OutputKind,
    pub name: String,
    pub list_id: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub target: Option<String>,
    pub msg_fmt: Option<String>,
    #[serde(default)]
    pub omit_ad_tracking: bool,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
