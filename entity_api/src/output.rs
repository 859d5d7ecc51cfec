use super::error::{EntityApiErrorKind, Error};
use entity::outputs::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, QueryOrder, TryIntoModel,
};

pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    debug!("Creating {} output for user {}", model.output_kind, model.user_id);

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        user_id: Set(model.user_id),
        output_kind: Set(model.output_kind),
        name: Set(model.name),
        list_id: Set(model.list_id),
        api_key: Set(model.api_key),
        target: Set(model.target),
        msg_fmt: Set(model.msg_fmt),
        omit_ad_tracking: Set(model.omit_ad_tracking),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

/// Finds an output only if it belongs to `user_id`.
///
/// Outputs owned by someone else are reported exactly like missing ones.
pub async fn find_by_id_and_user_id(
    db: &DatabaseConnection,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Outputs owned by `user_id`, or every output when no owner is given.
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

/// Replaces every editable column of the output `id`. Ownership never changes.
pub async fn update(db: &DatabaseConnection, id: Id, model: Model) -> Result<Model, Error> {
    let existing = find_by_id(db, id).await?;
    debug!("Updating {} output {id}", model.output_kind);

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        user_id: Unchanged(existing.user_id),
        output_kind: Set(model.output_kind),
        name: Set(model.name),
        list_id: Set(model.list_id),
        api_key: Set(model.api_key),
        target: Set(model.target),
        msg_fmt: Set(model.msg_fmt),
        omit_ad_tracking: Set(model.omit_ad_tracking),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}
