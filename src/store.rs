//! `posts` table DDL, the store handle, and short-lived per-request sessions.
//!
//! The store is built once at startup and passed down in [`crate::AppState`]. Handlers take a
//! [`StoreSession`] per request; the session goes back to the pool when dropped, so it is released
//! on every exit path including errors.

use crate::error::{AppError, ConfigError};
use crate::post::{NewPost, Post, PostStatus};
use crate::service::PostValidator;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Connection, Sqlite, SqliteConnection, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const POSTS_TABLE: &str = "posts";

const POST_COLUMNS: &str =
    "id, scheduled_date, content_text, image_path, image_prompt, status, linkedin_post_id, created_at";

const DEFAULT_LIST_LIMIT: u32 = 100;
const MAX_LIST_LIMIT: u32 = 1000;

type PostRow = (
    i64,
    DateTime<Utc>,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    DateTime<Utc>,
);

fn post_from_row(row: PostRow) -> Result<Post, AppError> {
    let (
        id,
        scheduled_date,
        content_text,
        image_path,
        image_prompt,
        status,
        linkedin_post_id,
        created_at,
    ) = row;
    // A stored status outside the enum is corrupt data, not a bad request.
    let status = status
        .parse::<PostStatus>()
        .map_err(|e| AppError::Db(sqlx::Error::Decode(format!("posts.status: {}", e).into())))?;
    Ok(Post {
        id,
        scheduled_date,
        content_text,
        image_path,
        image_prompt,
        status,
        linkedin_post_id,
        created_at,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create the parent directory of a file-backed database (`data/` for `sqlite://data/posts.db`).
async fn ensure_database_dir(filename: &Path) -> Result<(), AppError> {
    match filename.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Config(ConfigError::Store(format!("create {}: {}", dir.display(), e)))
            })
        }
        _ => Ok(()),
    }
}

/// Open/close counters for store sessions.
#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicU64,
    closed: AtomicU64,
}

impl SessionStats {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> u64 {
        self.opened().saturating_sub(self.closed())
    }
}

/// Session factory bound to one connection string.
#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
    stats: Arc<SessionStats>,
}

impl PostStore {
    /// Connect and create the `posts` table if absent.
    /// Fails fast on a malformed or unreachable URL.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let in_memory = is_in_memory(database_url);
        if !in_memory {
            ensure_database_dir(options.get_filename()).await?;
        }
        // Every in-memory connection is its own database; keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        let store = Self::from_pool(pool);
        store.ensure_tables().await?;
        tracing::info!(in_memory, "post store ready");
        Ok(store)
    }

    /// Wrap an existing pool. Call [`PostStore::ensure_tables`] before use.
    pub fn from_pool(pool: SqlitePool) -> Self {
        PostStore {
            pool,
            stats: Arc::new(SessionStats::default()),
        }
    }

    /// CREATE TABLE IF NOT EXISTS; never alters or drops existing data.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                scheduled_date TIMESTAMP NOT NULL,
                content_text TEXT NOT NULL,
                image_path TEXT,
                image_prompt TEXT,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'posted', 'failed')),
                linkedin_post_id TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            POSTS_TABLE
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn session(&self) -> Result<StoreSession, AppError> {
        let conn = self.pool.acquire().await?;
        let id = self.stats.opened.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(session = id, "store session opened");
        Ok(StoreSession {
            conn,
            stats: Arc::clone(&self.stats),
            id,
        })
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// One pooled connection scoped to a request. Released exactly once, on drop.
pub struct StoreSession {
    conn: PoolConnection<Sqlite>,
    stats: Arc<SessionStats>,
    id: u64,
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(session = self.id, "store session closed");
    }
}

async fn insert_on(conn: &mut SqliteConnection, post: &NewPost) -> Result<Post, AppError> {
    let sql = format!(
        "INSERT INTO {} (scheduled_date, content_text, image_path, image_prompt, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
        POSTS_TABLE, POST_COLUMNS
    );
    let row: PostRow = sqlx::query_as(&sql)
        .bind(post.scheduled_date)
        .bind(&post.content_text)
        .bind(&post.image_path)
        .bind(&post.image_prompt)
        .bind(PostStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    post_from_row(row)
}

impl StoreSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scoped transaction on this session's connection. Rolled back on drop unless committed.
    pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>, AppError> {
        Ok(Connection::begin(&mut *self.conn).await?)
    }

    /// Insert one pending post.
    pub async fn insert_post(&mut self, post: &NewPost) -> Result<Post, AppError> {
        PostValidator::validate_new(post)?;
        insert_on(&mut self.conn, post).await
    }

    /// Insert pending posts in one transaction; either all are stored or none.
    pub async fn insert_posts(&mut self, posts: &[NewPost]) -> Result<Vec<Post>, AppError> {
        for post in posts {
            PostValidator::validate_new(post)?;
        }
        let mut tx = self.begin().await?;
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            out.push(insert_on(&mut tx, post).await?);
        }
        tx.commit().await?;
        Ok(out)
    }

    pub async fn get_post(&mut self, id: i64) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", POST_COLUMNS, POSTS_TABLE);
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        row.map(post_from_row).transpose()
    }

    /// List posts by scheduled date, optionally filtered by status.
    /// Limit defaults to 100, max 1000.
    pub async fn list_posts(
        &mut self,
        status: Option<PostStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Post>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        let rows: Vec<PostRow> = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE status = ? ORDER BY scheduled_date, id LIMIT ?",
                    POST_COLUMNS, POSTS_TABLE
                );
                sqlx::query_as(&sql)
                    .bind(status.as_str())
                    .bind(limit)
                    .fetch_all(&mut *self.conn)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM {} ORDER BY scheduled_date, id LIMIT ?",
                    POST_COLUMNS, POSTS_TABLE
                );
                sqlx::query_as(&sql)
                    .bind(limit)
                    .fetch_all(&mut *self.conn)
                    .await?
            }
        };
        rows.into_iter().map(post_from_row).collect()
    }

    pub async fn count_posts(&mut self) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}", POSTS_TABLE);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&mut *self.conn).await?;
        Ok(count)
    }

    /// Bodies of the latest scheduled posts, newest first.
    pub async fn recent_content(&mut self, limit: u32) -> Result<Vec<String>, AppError> {
        let sql = format!(
            "SELECT content_text FROM {} ORDER BY scheduled_date DESC, id DESC LIMIT ?",
            POSTS_TABLE
        );
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.into_iter().map(|(text,)| text).collect())
    }

    /// Record a successful publish together with the platform's post id.
    pub async fn mark_posted(&mut self, id: i64, linkedin_post_id: &str) -> Result<Post, AppError> {
        PostValidator::validate_transition(PostStatus::Posted, Some(linkedin_post_id))?;
        self.set_status(id, PostStatus::Posted, Some(linkedin_post_id.trim())).await
    }

    pub async fn mark_failed(&mut self, id: i64) -> Result<Post, AppError> {
        PostValidator::validate_transition(PostStatus::Failed, None)?;
        self.set_status(id, PostStatus::Failed, None).await
    }

    async fn set_status(
        &mut self,
        id: i64,
        status: PostStatus,
        linkedin_post_id: Option<&str>,
    ) -> Result<Post, AppError> {
        let sql = format!(
            "UPDATE {} SET status = ?, linkedin_post_id = ? WHERE id = ? RETURNING {}",
            POSTS_TABLE, POST_COLUMNS
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(status.as_str())
            .bind(linkedin_post_id)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        let row = row.ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;
        post_from_row(row)
    }
}
