use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established ({max_connections} max connections)");
    Ok(pool)
}

/// Tables and indexes, in dependency order. Every statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id                 BIGSERIAL PRIMARY KEY,
        first_name         TEXT NOT NULL,
        second_name        TEXT NOT NULL,
        age                INTEGER NOT NULL,
        status             INTEGER NOT NULL,
        city               TEXT NOT NULL,
        desired_position   TEXT NOT NULL,
        education_degree   INTEGER NOT NULL,
        working_experience TEXT NOT NULL DEFAULT '',
        about_oneself      TEXT NOT NULL DEFAULT '',
        published          BOOLEAN NOT NULL DEFAULT TRUE,
        time_create        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS candidates_skills (
        id                  BIGSERIAL PRIMARY KEY,
        foreign_key         BIGINT NOT NULL REFERENCES candidates (id) ON DELETE CASCADE,
        name                TEXT NOT NULL,
        normalized_name     TEXT NOT NULL,
        level               INTEGER NOT NULL,
        years_of_experience INTEGER NOT NULL,
        last_used_year      INTEGER NOT NULL,
        score               INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_openings (
        id              BIGSERIAL PRIMARY KEY,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL DEFAULT '',
        address         TEXT NOT NULL,
        salary          INTEGER NOT NULL,
        skills_quantity INTEGER NOT NULL DEFAULT 0,
        time_create     TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS required_skills (
        id                  BIGSERIAL PRIMARY KEY,
        foreign_key         BIGINT NOT NULL REFERENCES job_openings (id) ON DELETE CASCADE,
        name                TEXT NOT NULL,
        normalized_name     TEXT NOT NULL,
        level               INTEGER NOT NULL,
        years_of_experience INTEGER NOT NULL,
        score               INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS candidates_skills_foreign_key_idx ON candidates_skills (foreign_key)",
    "CREATE INDEX IF NOT EXISTS candidates_skills_normalized_name_idx ON candidates_skills (normalized_name)",
    "CREATE INDEX IF NOT EXISTS required_skills_foreign_key_idx ON required_skills (foreign_key)",
    "CREATE INDEX IF NOT EXISTS required_skills_normalized_name_idx ON required_skills (normalized_name)",
];

/// Creates any missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply database schema")?;
    }
    info!("Database schema is up to date");
    Ok(())
}
