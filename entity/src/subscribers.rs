//! Visitors captured through a campaign link.

use crate::provider::Provider;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::subscribers::Model)]
#[sea_orm(schema_name = "campaign_relay", table_name = "subscribers")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = uuid::Uuid)]
    pub email_list_id: Id,
    /// Owner of the list at the time the subscriber was captured.
    #[schema(value_type = uuid::Uuid)]
    pub user_id: Id,
    pub source_provider_name: Provider,
    pub name: String,
    #[sea_orm(unique)]
    pub email_addr: String,
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
        belongs_to = "super::email_lists::Entity",
        from = "Column::EmailListId",
        to = "super::email_lists::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    EmailLists,
}

impl Related<super::email_lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailLists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
