//! 日付ごとの送信済み記録を PostgreSQL に保存するストア。

use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rtnotify_core::{DedupStore, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::StoreConfig;

/// `sent_posts` テーブルを使う送信済みストア。
///
/// `post_date` を主キーにしているので、同じ日付の記録は 1 件しか書き込めない。
pub struct PgSentStore {
    pool: PgPool,
}

impl PgSentStore {
    /// データベースに接続する。設定に応じてマイグレーションも実行する。
    pub async fn connect(config: &StoreConfig, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl DedupStore for PgSentStore {
    async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sent_posts WHERE post_date = $1)",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(Box::new(e)))
    }

    async fn record(&self, date: NaiveDate, post_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO sent_posts (post_date, post_id) VALUES ($1, $2) \
             ON CONFLICT (post_date) DO NOTHING",
        )
        .bind(date)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed(Box::new(e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(date));
        }

        Ok(())
    }
}
