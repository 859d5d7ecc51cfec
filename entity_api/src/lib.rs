use log::info;
use sea_orm::DatabaseConnection;

pub use entity::{email_lists, outputs, subscribers, users, Id};

pub mod email_list;
pub mod error;
pub mod output;
pub mod subscriber;
pub mod user;

/// Demo operator, list and webhook output for local development.
///
/// Returns the created list and output so the caller can print a ready-to-use campaign.
pub async fn seed_database(
    db: &DatabaseConnection,
    webhook_url: &str,
) -> Result<(email_lists::Model, outputs::Model), error::Error> {
    let now = chrono::Utc::now();

    let operator = user::create(db, "Demo Operator").await?;

    let list = email_list::create(
        db,
        email_lists::Model {
            id: Id::new_v4(),
            user_id: operator.id,
            name: "Demo waitlist".to_owned(),
            description: Some("Seeded for local development".to_owned()),
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    let webhook = output::create(
        db,
        outputs::Model {
            id: Id::new_v4(),
            user_id: operator.id,
            output_kind: entity::output_kind::OutputKind::Webhook,
            name: "Demo webhook".to_owned(),
            list_id: None,
            api_key: None,
            target: Some(webhook_url.to_owned()),
            msg_fmt: None,
            omit_ad_tracking: false,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;

    info!(
        "Seeded operator {} with list {} and webhook output {}",
        operator.id, list.id, webhook.id
    );

    Ok((list, webhook))
}
