use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create model catalog tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS model_versions (
            model_id VARCHAR(60) PRIMARY KEY,
            description VARCHAR(200) NOT NULL DEFAULT '',
            backend VARCHAR(50) NOT NULL,
            model_artifact TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            credits_required DOUBLE PRECISION NOT NULL DEFAULT 0,
            major_version INTEGER NOT NULL DEFAULT 0,
            minor_version INTEGER NOT NULL DEFAULT 0,
            language_code VARCHAR(35) NOT NULL DEFAULT 'en'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS structures (
            id SERIAL PRIMARY KEY,
            model_id VARCHAR(60) NOT NULL REFERENCES model_versions(model_id) ON DELETE CASCADE,
            name VARCHAR(200) NOT NULL,
            color_r INTEGER NOT NULL DEFAULT 0,
            color_g INTEGER NOT NULL DEFAULT 0,
            color_b INTEGER NOT NULL DEFAULT 0,
            kind INTEGER NOT NULL DEFAULT 2,
            fma_code INTEGER NOT NULL DEFAULT 0,
            input_channel_id VARCHAR(200) NOT NULL,
            structure_id VARCHAR(200) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create segmentation jobs table. Inserting a Queued row is the enqueue;
    // the worker claims rows by compare-and-swap on the status column.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS segmentation_jobs (
            id UUID PRIMARY KEY,
            model_id VARCHAR(60) NOT NULL,
            status VARCHAR(20) NOT NULL,
            input_ref TEXT NOT NULL,
            output_ref TEXT,
            error VARCHAR(200),
            created_at TIMESTAMPTZ NOT NULL,
            started_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create feedback tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id SERIAL PRIMARY KEY,
            client_information VARCHAR(200) NOT NULL,
            segmentation_id VARCHAR(200) NOT NULL,
            segmentation_accepted BOOLEAN NOT NULL,
            general_comments TEXT NOT NULL,
            general_score DOUBLE PRECISION
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS structure_comments (
            id SERIAL PRIMARY KEY,
            feedback_id INTEGER NOT NULL REFERENCES feedback(id) ON DELETE CASCADE,
            structure_id VARCHAR(200) NOT NULL,
            comments TEXT NOT NULL,
            score DOUBLE PRECISION
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create telemetry table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS telemetry (
            id SERIAL PRIMARY KEY,
            client_software_version VARCHAR(200) NOT NULL,
            upload_time_ms BIGINT NOT NULL,
            segmentation_wait_ms BIGINT NOT NULL,
            segmentation_down_ms BIGINT NOT NULL,
            segmentation_retries INTEGER NOT NULL,
            segmentation_model_id VARCHAR(200) NOT NULL,
            segmentation_id VARCHAR(200) NOT NULL,
            client_error INTEGER NOT NULL,
            client_error_info TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON segmentation_jobs(status)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON segmentation_jobs(created_at ASC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_structures_model_id ON structures(model_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
