use super::error::{EntityApiErrorKind, Error};
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, QueryOrder, TryIntoModel};

pub async fn create(db: &DatabaseConnection, name: &str) -> Result<Model, Error> {
    debug!("Creating operator \"{name}\"");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::CreatedAt).all(db).await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn find_by_id_returns_record_not_found_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let err = find_by_id(&db, Id::new_v4()).await.unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
    }

    #[tokio::test]
    async fn find_all_returns_every_operator() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let operators: Vec<Model> = ["Ada", "Grace"]
            .iter()
            .map(|name| Model {
                id: Id::new_v4(),
                name: ToString::to_string(name),
                created_at: now.into(),
                updated_at: now.into(),
            })
            .collect();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![operators.clone()])
            .into_connection();

        assert_eq!(find_all(&db).await?, operators);

        Ok(())
    }
}
