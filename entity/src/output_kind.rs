use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Downstream integration an output row delivers to.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "output_kind")]
pub enum OutputKind {
    #[sea_orm(string_value = "aweber")]
    Aweber,
    #[sea_orm(string_value = "resend")]
    Resend,
    #[sea_orm(string_value = "brevo")]
    Brevo,
    #[sea_orm(string_value = "telegram")]
    Telegram,
    #[sea_orm(string_value = "webhook")]
    Webhook,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aweber => "AWeber",
            Self::Resend => "Resend",
            Self::Brevo => "Brevo",
            Self::Telegram => "Telegram",
            Self::Webhook => "Webhook",
        };
        f.write_str(name)
    }
}
