use super::error::{EntityApiErrorKind, Error};
use entity::email_lists::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, TryIntoModel};

pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    debug!("Creating email list \"{}\" for user {}", model.name, model.user_id);

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        user_id: Set(model.user_id),
        name: Set(model.name),
        description: Set(model.description),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Looks up a list by id. The list's `user_id` scopes every output lookup for a campaign.
pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Lists owned by `user_id`, or every list when no owner is given.
pub async fn find_by_user_id(
    db: &DatabaseConnection,
    user_id: Option<Id>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();
    if let Some(user_id) = user_id {
        query = query.filter(Column::UserId.eq(user_id));
    }
    Ok(query.order_by_asc(Column::CreatedAt).all(db).await?)
}
