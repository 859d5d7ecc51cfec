//! The storage the campaign flow and the operator API need, behind a trait so tests can run
//! without Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_auth::oauth::ProviderName;
use entity::provider::Provider;
use entity_api::{email_list, output, subscriber, user};
use sea_orm::DatabaseConnection;

use crate::error::Error;
use crate::{email_lists, outputs, subscribers, users, Id};

/// A subscriber about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriber {
    pub list_id: Id,
    /// Owner of the list.
    pub owner_id: Id,
    pub provider: ProviderName,
    pub display_name: String,
    pub email_address: String,
}

impl NewSubscriber {
    fn into_model(self) -> subscribers::Model {
        let now = chrono::Utc::now();
        subscribers::Model {
            id: Id::new_v4(),
            email_list_id: self.list_id,
            user_id: self.owner_id,
            source_provider_name: provider_column(self.provider),
            name: self.display_name,
            email_addr: self.email_address,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }
}

fn provider_column(name: ProviderName) -> Provider {
    match name {
        ProviderName::Google => Provider::Google,
        ProviderName::Discord => Provider::Discord,
    }
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Fails with `EntityErrorKind::Duplicate` when the email address is already captured.
    async fn insert_subscriber(&self, new: NewSubscriber) -> Result<subscribers::Model, Error>;

    /// Outputs owned by another user are reported as not found.
    async fn output_by_id_and_owner(&self, id: Id, owner_id: Id)
        -> Result<outputs::Model, Error>;

    async fn list_by_id(&self, id: Id) -> Result<email_lists::Model, Error>;

    async fn create_user(&self, name: &str) -> Result<users::Model, Error>;

    async fn user_by_id(&self, id: Id) -> Result<users::Model, Error>;

    async fn find_users(&self) -> Result<Vec<users::Model>, Error>;

    async fn create_list(&self, list: email_lists::Model) -> Result<email_lists::Model, Error>;

    /// Every list when `owner_id` is `None`.
    async fn find_lists(&self, owner_id: Option<Id>) -> Result<Vec<email_lists::Model>, Error>;

    async fn create_output(&self, output: outputs::Model) -> Result<outputs::Model, Error>;

    async fn output_by_id(&self, id: Id) -> Result<outputs::Model, Error>;

    /// Every output when `owner_id` is `None`.
    async fn find_outputs(&self, owner_id: Option<Id>) -> Result<Vec<outputs::Model>, Error>;

    /// Overwrites the editable columns of output `id`. The owner is kept.
    async fn update_output(&self, id: Id, output: outputs::Model) -> Result<outputs::Model, Error>;

    /// Every subscriber when `owner_id` is `None`.
    async fn find_subscribers(
        &self,
        owner_id: Option<Id>,
    ) -> Result<Vec<subscribers::Model>, Error>;
}

/// `CampaignStore` backed by the `entity_api` queries.
#[derive(Clone)]
pub struct DbStore {
    db: Arc<DatabaseConnection>,
}

impl DbStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CampaignStore for DbStore {
    async fn insert_subscriber(&self, new: NewSubscriber) -> Result<subscribers::Model, Error> {
        Ok(subscriber::create(&self.db, new.into_model()).await?)
    }

    async fn output_by_id_and_owner(
        &self,
        id: Id,
        owner_id: Id,
    ) -> Result<outputs::Model, Error> {
        Ok(output::find_by_id_and_user_id(&self.db, id, owner_id).await?)
    }

    async fn list_by_id(&self, id: Id) -> Result<email_lists::Model, Error> {
        Ok(email_list::find_by_id(&self.db, id).await?)
    }

    async fn create_user(&self, name: &str) -> Result<users::Model, Error> {
        Ok(user::create(&self.db, name).await?)
    }

    async fn user_by_id(&self, id: Id) -> Result<users::Model, Error> {
        Ok(user::find_by_id(&self.db, id).await?)
    }

    async fn find_users(&self) -> Result<Vec<users::Model>, Error> {
        Ok(user::find_all(&self.db).await?)
    }

    async fn create_list(&self, list: email_lists::Model) -> Result<email_lists::Model, Error> {
        Ok(email_list::create(&self.db, list).await?)
    }

    async fn find_lists(&self, owner_id: Option<Id>) -> Result<Vec<email_lists::Model>, Error> {
        Ok(email_list::find_by_user_id(&self.db, owner_id).await?)
    }

    async fn create_output(&self, output: outputs::Model) -> Result<outputs::Model, Error> {
        Ok(output::create(&self.db, output).await?)
    }

    async fn output_by_id(&self, id: Id) -> Result<outputs::Model, Error> {
        Ok(output::find_by_id(&self.db, id).await?)
    }

    async fn find_outputs(&self, owner_id: Option<Id>) -> Result<Vec<outputs::Model>, Error> {
        Ok(output::find_by_user_id(&self.db, owner_id).await?)
    }

    async fn update_output(&self, id: Id, output: outputs::Model) -> Result<outputs::Model, Error> {
        Ok(output::update(&self.db, id, output).await?)
    }

    async fn find_subscribers(
        &self,
        owner_id: Option<Id>,
    ) -> Result<Vec<subscribers::Model>, Error> {
        Ok(subscriber::find_by_user_id(&self.db, owner_id).await?)
    }
}

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;

#[cfg(any(test, feature = "mock"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};

    use super::*;

    /// In-process store with the same uniqueness and ownership rules as the database.
    #[derive(Default)]
    pub struct MemoryStore {
        users: Mutex<HashMap<Id, users::Model>>,
        lists: Mutex<HashMap<Id, email_lists::Model>>,
        outputs: Mutex<HashMap<Id, outputs::Model>>,
        subscribers: Mutex<Vec<subscribers::Model>>,
    }

    fn entity_error(error_kind: EntityApiErrorKind) -> Error {
        EntityApiError {
            source: None,
            error_kind,
        }
        .into()
    }

    fn lock_error<T>(_: T) -> Error {
        entity_error(EntityApiErrorKind::SystemError)
    }

    fn owned_by<T: Clone>(
        rows: &HashMap<Id, T>,
        owner_id: Option<Id>,
        owner_of: impl Fn(&T) -> Id,
    ) -> Vec<T> {
        rows.values()
            .filter(|row| owner_id.map_or(true, |owner| owner_of(row) == owner))
            .cloned()
            .collect()
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_user(&self, user: users::Model) {
            if let Ok(mut users) = self.users.lock() {
                users.insert(user.id, user);
            }
        }

        pub fn add_list(&self, list: email_lists::Model) {
            if let Ok(mut lists) = self.lists.lock() {
                lists.insert(list.id, list);
            }
        }

        pub fn add_output(&self, output: outputs::Model) {
            if let Ok(mut outputs) = self.outputs.lock() {
                outputs.insert(output.id, output);
            }
        }

        pub fn subscribers(&self) -> Vec<subscribers::Model> {
            self.subscribers
                .lock()
                .map(|s| s.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl CampaignStore for MemoryStore {
        async fn insert_subscriber(
            &self,
            new: NewSubscriber,
        ) -> Result<subscribers::Model, Error> {
            let mut subscribers = self
                .subscribers
                .lock()
                .map_err(|_| entity_error(EntityApiErrorKind::SystemError))?;
            if subscribers
                .iter()
                .any(|s| s.email_addr == new.email_address)
            {
                return Err(entity_error(EntityApiErrorKind::DuplicateRecord));
            }
            let model = new.into_model();
            subscribers.push(model.clone());
            Ok(model)
        }

        async fn output_by_id_and_owner(
            &self,
            id: Id,
            owner_id: Id,
        ) -> Result<outputs::Model, Error> {
            self.outputs
                .lock()
                .map_err(|_| entity_error(EntityApiErrorKind::SystemError))?
                .get(&id)
                .filter(|o| o.user_id == owner_id)
                .cloned()
                .ok_or_else(|| entity_error(EntityApiErrorKind::RecordNotFound))
        }

        async fn list_by_id(&self, id: Id) -> Result<email_lists::Model, Error> {
            self.lists
                .lock()
                .map_err(|_| entity_error(EntityApiErrorKind::SystemError))?
                .get(&id)
                .cloned()
                .ok_or_else(|| entity_error(EntityApiErrorKind::RecordNotFound))
        }

        async fn create_user(&self, name: &str) -> Result<users::Model, Error> {
            let now = chrono::Utc::now();
            let model = users::Model {
                id: Id::new_v4(),
                name: name.to_string(),
                created_at: now.into(),
                updated_at: now.into(),
            };
            self.users
                .lock()
                .map_err(lock_error)?
                .insert(model.id, model.clone());
            Ok(model)
        }

        async fn user_by_id(&self, id: Id) -> Result<users::Model, Error> {
            self.users
                .lock()
                .map_err(lock_error)?
                .get(&id)
                .cloned()
                .ok_or_else(|| entity_error(EntityApiErrorKind::RecordNotFound))
        }

        async fn find_users(&self) -> Result<Vec<users::Model>, Error> {
            let mut users: Vec<_> = self
                .users
                .lock()
                .map_err(lock_error)?
                .values()
                .cloned()
                .collect();
            users.sort_by_key(|u| u.created_at);
            Ok(users)
        }

        async fn create_list(&self, list: email_lists::Model) -> Result<email_lists::Model, Error> {
            let now = chrono::Utc::now();
            let model = email_lists::Model {
                id: Id::new_v4(),
                created_at: now.into(),
                updated_at: now.into(),
                ..list
            };
            self.add_list(model.clone());
            Ok(model)
        }

        async fn find_lists(
            &self,
            owner_id: Option<Id>,
        ) -> Result<Vec<email_lists::Model>, Error> {
            let lists = self.lists.lock().map_err(lock_error)?;
            let mut found = owned_by(&lists, owner_id, |l| l.user_id);
            found.sort_by_key(|l| l.created_at);
            Ok(found)
        }

        async fn create_output(&self, output: outputs::Model) -> Result<outputs::Model, Error> {
            let now = chrono::Utc::now();
            let model = outputs::Model {
                id: Id::new_v4(),
                created_at: now.into(),
                updated_at: now.into(),
                ..output
            };
            self.add_output(model.clone());
            Ok(model)
        }

        async fn output_by_id(&self, id: Id) -> Result<outputs::Model, Error> {
            self.outputs
                .lock()
                .map_err(lock_error)?
                .get(&id)
                .cloned()
                .ok_or_else(|| entity_error(EntityApiErrorKind::RecordNotFound))
        }

        async fn find_outputs(&self, owner_id: Option<Id>) -> Result<Vec<outputs::Model>, Error> {
            let outputs = self.outputs.lock().map_err(lock_error)?;
            let mut found = owned_by(&outputs, owner_id, |o| o.user_id);
            found.sort_by_key(|o| o.created_at);
            Ok(found)
        }

        async fn update_output(
            &self,
            id: Id,
            output: outputs::Model,
        ) -> Result<outputs::Model, Error> {
            let mut outputs = self.outputs.lock().map_err(lock_error)?;
            let existing = outputs
                .get(&id)
                .cloned()
                .ok_or_else(|| entity_error(EntityApiErrorKind::RecordNotFound))?;
            let model = outputs::Model {
                id,
                user_id: existing.user_id,
                created_at: existing.created_at,
                updated_at: chrono::Utc::now().into(),
                ..output
            };
            outputs.insert(id, model.clone());
            Ok(model)
        }

        async fn find_subscribers(
            &self,
            owner_id: Option<Id>,
        ) -> Result<Vec<subscribers::Model>, Error> {
            Ok(self
                .subscribers
                .lock()
                .map_err(lock_error)?
                .iter()
                .rev()
                .filter(|s| owner_id.map_or(true, |owner| s.user_id == owner))
                .cloned()
                .collect())
        }
    }
}
