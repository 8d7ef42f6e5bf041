use crate::models::{AnalyticsEvent, Link, NewAnalyticsEvent, NewLink};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::sync::Arc;

const LINK_COLUMNS: &str =
    "id, short_code, original_url, title, description, image_url, clicks, created_at";

const EVENT_COLUMNS: &str = "id, link_id, user_agent, ip, platform, created_at";

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn insert_event(
        tx: &mut Transaction<'_, Sqlite>,
        link_id: &str,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent> {
        let row = AnalyticsEvent {
            id: uuid::Uuid::new_v4().to_string(),
            link_id: link_id.to_string(),
            user_agent: event.user_agent,
            ip: event.ip,
            platform: event.platform,
            created_at: now_millis(),
        };

        sqlx::query(
            r#"
            INSERT INTO analytics_events (id, link_id, user_agent, ip, platform, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.link_id)
        .bind(&row.user_agent)
        .bind(&row.ip)
        .bind(&row.platform)
        .bind(row.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(row)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id TEXT PRIMARY KEY NOT NULL,
                short_code TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                image_url TEXT NOT NULL DEFAULT '',
                clicks INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_created_at ON links(created_at)")
            .execute(self.pool.as_ref())
            .await?;

        // No ON DELETE CASCADE: events must be removed before their link.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_events (
                id TEXT PRIMARY KEY NOT NULL,
                link_id TEXT NOT NULL REFERENCES links(id),
                user_agent TEXT NOT NULL DEFAULT '',
                ip TEXT NOT NULL DEFAULT 'unknown',
                platform TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_analytics_events_link_id ON analytics_events(link_id)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_link_by_short_code(&self, short_code: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = ?"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_link_by_id(&self, id: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn find_analytics_events(&self, link_id: &str) -> Result<Vec<AnalyticsEvent>> {
        let events = sqlx::query_as::<_, AnalyticsEvent>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM analytics_events
            WHERE link_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(events)
    }

    async fn create_link(&self, link: NewLink) -> StorageResult<Link> {
        let row = Link {
            id: uuid::Uuid::new_v4().to_string(),
            short_code: link.short_code,
            original_url: link.original_url,
            title: link.title,
            description: link.description,
            image_url: link.image_url,
            clicks: 0,
            created_at: now_millis(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO links (id, short_code, original_url, title, description, image_url, clicks, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(&row.id)
        .bind(&row.short_code)
        .bind(&row.original_url)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.image_url)
        .bind(row.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(row)
    }

    async fn increment_clicks(&self, id: &str, by: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + ?
            WHERE id = ?
            "#,
        )
        .bind(by)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_analytics_event(
        &self,
        link_id: &str,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent> {
        let mut tx = self.pool.begin().await?;
        let row = Self::insert_event(&mut tx, link_id, event).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_analytics_events_by_link_id(&self, link_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM analytics_events WHERE link_id = ?")
            .bind(link_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_link_by_id(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn record_click(&self, link_id: &str, event: NewAnalyticsEvent) -> Result<AnalyticsEvent> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE links SET clicks = clicks + 1 WHERE id = ?")
            .bind(link_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            anyhow::bail!("link {link_id} does not exist");
        }

        let row = Self::insert_event(&mut tx, link_id, event).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn remove_link(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM analytics_events WHERE link_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            // Nothing to delete; drop the transaction and roll back.
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
