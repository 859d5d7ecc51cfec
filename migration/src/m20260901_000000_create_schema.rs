use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS campaign_relay;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO campaign_relay, public;")
            .await?;

        // The application role owns everything it creates in the schema
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA campaign_relay TO CURRENT_USER;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA campaign_relay GRANT ALL ON TABLES TO CURRENT_USER;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA campaign_relay GRANT ALL ON SEQUENCES TO CURRENT_USER;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS campaign_relay CASCADE;")
            .await?;

        Ok(())
    }
}
