use crate::{config::DatabaseConfig, error::AppError, types::PredictionRecord};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

const CREATE_PREDICTIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        input_text TEXT NOT NULL,
        label TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

/// Append-only store of past predictions.
#[derive(Clone)]
pub struct PredictionStore {
    pool: SqlitePool,
}

impl PredictionStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let newly_created = !config.path.exists();

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", config.path.display());
        } else {
            info!("Opened existing database: {}", config.path.display());
        }

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// A private in-memory database. One connection, since every SQLite
    /// connection to `:memory:` sees its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), AppError> {
        sqlx::query(CREATE_PREDICTIONS).execute(&self.pool).await?;
        Ok(())
    }

    /// Drops every stored prediction and recreates the table.
    pub async fn reset(&self) -> Result<(), AppError> {
        warn!("Resetting predictions table");
        sqlx::query("DROP TABLE IF EXISTS predictions")
            .execute(&self.pool)
            .await?;
        self.create_schema().await
    }

    pub async fn insert(&self, input_text: &str, label: &str) -> Result<PredictionRecord, AppError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO predictions (input_text, label, created_at) VALUES (?, ?, ?)",
        )
        .bind(input_text)
        .bind(label)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Stored prediction {} ({})", id, label);

        Ok(PredictionRecord {
            id,
            input_text: input_text.to_string(),
            label: label.to_string(),
            created_at,
        })
    }

    /// Most recent first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<PredictionRecord>, AppError> {
        let rows: Vec<(i64, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, input_text, label, created_at FROM predictions ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, input_text, label, created_at)| PredictionRecord {
                id,
                input_text,
                label,
                created_at,
            })
            .collect())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
