use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TYPE campaign_relay.provider AS ENUM ('google', 'discord')",
    "CREATE TYPE campaign_relay.output_kind AS ENUM ('aweber', 'resend', 'brevo', 'telegram', 'webhook')",
    r#"
    CREATE TABLE IF NOT EXISTS campaign_relay.users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS campaign_relay.email_lists (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES campaign_relay.users(id) ON DELETE CASCADE,
        name VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    // email_addr is unique across every list: a visitor is captured once.
    r#"
    CREATE TABLE IF NOT EXISTS campaign_relay.subscribers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email_list_id UUID NOT NULL REFERENCES campaign_relay.email_lists(id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES campaign_relay.users(id) ON DELETE CASCADE,
        source_provider_name campaign_relay.provider NOT NULL,
        name VARCHAR(255) NOT NULL DEFAULT '',
        email_addr VARCHAR(320) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT subscribers_email_addr_key UNIQUE (email_addr)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS campaign_relay.outputs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES campaign_relay.users(id) ON DELETE CASCADE,
        output_kind campaign_relay.output_kind NOT NULL,
        name VARCHAR(255) NOT NULL,
        list_id VARCHAR(255),
        api_key TEXT,
        target TEXT,
        msg_fmt TEXT,
        omit_ad_tracking BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_outputs_user_id ON campaign_relay.outputs(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_subscribers_email_list_id ON campaign_relay.subscribers(email_list_id)",
];

const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS campaign_relay.outputs",
    "DROP TABLE IF EXISTS campaign_relay.subscribers",
    "DROP TABLE IF EXISTS campaign_relay.email_lists",
    "DROP TABLE IF EXISTS campaign_relay.users",
    "DROP TYPE IF EXISTS campaign_relay.output_kind",
    "DROP TYPE IF EXISTS campaign_relay.provider",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in CREATE_STATEMENTS {
            manager.get_connection().execute_unprepared(statement).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in DROP_STATEMENTS {
            manager.get_connection().execute_unprepared(statement).await?;
        }
        Ok(())
    }
}
