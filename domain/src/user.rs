use crate::error::{invalid, Error};
use crate::store::CampaignStore;
use crate::users::Model;

pub async fn create(store: &dyn CampaignStore, name: &str) -> Result<Model, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    store.create_user(name).await
}

pub async fn find_all(store: &dyn CampaignStore) -> Result<Vec<Model>, Error> {
    store.find_users().await
}
