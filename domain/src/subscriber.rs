use crate::error::Error;
use crate::store::CampaignStore;
use crate::subscribers::Model;
use crate::Id;

/// Newest first.
pub async fn find_by(store: &dyn CampaignStore, owner_id: Option<Id>) -> Result<Vec<Model>, Error> {
    store.find_subscribers(owner_id).await
}
