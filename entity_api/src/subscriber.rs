use super::error::Error;
use entity::subscribers::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, TryIntoModel};

/// Inserts a new subscriber.
///
/// `email_addr` is unique across all lists, so a repeat visitor yields
/// `EntityApiErrorKind::DuplicateRecord`.
pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    debug!(
        "Creating subscriber on list {} via {}",
        model.email_list_id, model.source_provider_name
    );

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        email_list_id: Set(model.email_list_id),
        user_id: Set(model.user_id),
        source_provider_name: Set(model.source_provider_name),
        name: Set(model.name),
        email_addr: Set(model.email_addr),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Subscribers captured on lists owned by `user_id`, or all of them when no owner is given.
pub async fn find_by_user_id(
    db: &DatabaseConnection,
    user_id: Option<Id>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();
    if let Some(user_id) = user_id {
        query = query.filter(Column::UserId.eq(user_id));
    }
    Ok(query.order_by_desc(Column::CreatedAt).all(db).await?)
}
