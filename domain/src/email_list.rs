use crate::email_lists::Model;
use crate::error::{invalid, DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::store::CampaignStore;
use crate::Id;

/// An email list as an operator asks for it.
#[derive(Debug, Clone)]
pub struct NewEmailList {
    pub user_id: Id,
    pub name: String,
    pub description: Option<String>,
}

pub async fn create(store: &dyn CampaignStore, new: NewEmailList) -> Result<Model, Error> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    ensure_owner_exists(store, new.user_id).await?;

    let now = chrono::Utc::now();
    store
        .create_list(Model {
            id: Id::nil(),
            user_id: new.user_id,
            name: name.to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
            created_at: now.into(),
            updated_at: now.into(),
        })
        .await
}

pub async fn find_by(store: &dyn CampaignStore, owner_id: Option<Id>) -> Result<Vec<Model>, Error> {
    store.find_lists(owner_id).await
}

/// An unknown owner is bad input, not a missing resource.
pub(crate) async fn ensure_owner_exists(store: &dyn CampaignStore, user_id: Id) -> Result<(), Error> {
    match store.user_by_id(user_id).await {
        Ok(_) => Ok(()),
        Err(Error {
            error_kind:
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound)),
            ..
        }) => Err(invalid("userId does not name an operator")),
        Err(err) => Err(err),
    }
}
