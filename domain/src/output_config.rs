//! Operator management of output rows.
//!
//! Validation here rejects what `OutputFactory::build` would later refuse, so a bad row is
//! caught at the API instead of failing every delivery. The Telegram bot token is the
//! exception: it may come from the service config, which is only known at delivery time.

use crate::OutputKind;

use crate::email_list::ensure_owner_exists;
use crate::error::{invalid, Error};
use crate::outputs::Model;
use crate::store::CampaignStore;
use crate::Id;

/// An output as an operator asks for it.
#[derive(Debug, Clone)]
pub struct NewOutput {
    pub user_id: Id,
    pub output_kind: OutputKind,
    pub name: String,
    pub list_id: Option<String>,
    pub api_key: Option<String>,
    pub target: Option<String>,
    pub msg_fmt: Option<String>,
    pub omit_ad_tracking: bool,
}

/// Columns left `None` are kept. An empty string clears an optional column.
#[derive(Debug, Clone, Default)]
pub struct OutputPatch {
    pub output_kind: Option<OutputKind>,
    pub name: Option<String>,
    pub list_id: Option<String>,
    pub api_key: Option<String>,
    pub target: Option<String>,
    pub msg_fmt: Option<String>,
    pub omit_ad_tracking: Option<bool>,
}

pub async fn create(store: &dyn CampaignStore, new: NewOutput) -> Result<Model, Error> {
    let now = chrono::Utc::now();
    let model = Model {
        id: Id::nil(),
        user_id: new.user_id,
        output_kind: new.output_kind,
        name: new.name.trim().to_string(),
        list_id: non_blank(new.list_id),
        api_key: non_blank(new.api_key),
        target: non_blank(new.target),
        msg_fmt: non_blank(new.msg_fmt),
        omit_ad_tracking: new.omit_ad_tracking,
        created_at: now.into(),
        updated_at: now.into(),
    };
    validate(&model)?;
    ensure_owner_exists(store, model.user_id).await?;
    store.create_output(model).await
}

pub async fn find_by(store: &dyn CampaignStore, owner_id: Option<Id>) -> Result<Vec<Model>, Error> {
    store.find_outputs(owner_id).await
}

pub async fn find_by_id(store: &dyn CampaignStore, id: Id) -> Result<Model, Error> {
    store.output_by_id(id).await
}

pub async fn update(store: &dyn CampaignStore, id: Id, patch: OutputPatch) -> Result<Model, Error> {
    let mut model = store.output_by_id(id).await?;
    if let Some(kind) = patch.output_kind {
        model.output_kind = kind;
    }
    if let Some(name) = patch.name {
        model.name = name.trim().to_string();
    }
    if let Some(flag) = patch.omit_ad_tracking {
        model.omit_ad_tracking = flag;
    }
    apply(&mut model.list_id, patch.list_id);
    apply(&mut model.api_key, patch.api_key);
    apply(&mut model.target, patch.target);
    apply(&mut model.msg_fmt, patch.msg_fmt);

    validate(&model)?;
    store.update_output(id, model).await
}

/// Checks that the row carries every column its kind needs.
pub fn validate(model: &Model) -> Result<(), Error> {
    if model.name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    match model.output_kind {
        OutputKind::Aweber => {
            present(&model.target, "target (AWeber account id)")?;
            present(&model.list_id, "listId")?;
            present(&model.api_key, "apiKey")?;
        }
        OutputKind::Resend => {
            present(&model.list_id, "listId (Resend audience id)")?;
            present(&model.api_key, "apiKey")?;
        }
        OutputKind::Brevo => {
            let list_id = present(&model.list_id, "listId")?;
            if list_id.parse::<u64>().is_err() {
                return Err(invalid("listId must be numeric for Brevo"));
            }
            present(&model.api_key, "apiKey")?;
        }
        OutputKind::Telegram => {
            present(&model.target, "target (Telegram chat id)")?;
        }
        OutputKind::Webhook => {
            let target = present(&model.target, "target (webhook URL)")?;
            match url::Url::parse(target) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => return Err(invalid("target must be an http or https URL")),
            }
        }
    }
    Ok(())
}

fn present<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .ok_or_else(|| invalid(&format!("{what} is required for this output kind")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn apply(column: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *column = non_blank(Some(value));
    }
}
