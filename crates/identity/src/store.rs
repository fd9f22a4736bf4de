//! Identity store trait and SQLite implementation.

use crate::error::{IdentityError, IdentityResult};
use crate::models::{IdentityRow, NewIdentity};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity store contract.
///
/// The persisted refresh token is the only piece of shared mutable
/// state in the system. Concurrent writers race last-writer-wins by
/// design; the loser's session fails its next refresh and re-logins.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an identity. Fails with [`IdentityError::AlreadyExists`]
    /// on a duplicate username or email.
    async fn create_identity(&self, identity: &NewIdentity) -> IdentityResult<IdentityRow>;

    /// Look up an identity by id.
    async fn find_by_id(&self, identity_id: Uuid) -> IdentityResult<Option<IdentityRow>>;

    /// Look up an identity by username or email. Email matching is
    /// case-insensitive; emails are stored lowercased.
    async fn find_by_identifier(&self, identifier: &str) -> IdentityResult<Option<IdentityRow>>;

    /// Replace the persisted refresh token. `None` clears the slot
    /// (logout); `Some` overwrites any prior value, invalidating the
    /// previous session.
    async fn set_refresh_token(
        &self,
        identity_id: Uuid,
        refresh_token: Option<&str>,
    ) -> IdentityResult<()>;

    /// Update the display name, returning the updated record.
    async fn update_display_name(
        &self,
        identity_id: Uuid,
        display_name: &str,
    ) -> IdentityResult<IdentityRow>;

    /// Replace the avatar reference (public id + url), returning the
    /// updated record. `None` clears the reference.
    async fn set_avatar(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow>;

    /// Replace the cover image reference, returning the updated record.
    async fn set_cover(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow>;

    /// Run database migrations.
    async fn migrate(&self) -> IdentityResult<()>;

    /// Check store connectivity and health.
    async fn health_check(&self) -> IdentityResult<()>;
}

/// SQLite-based identity store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, running migrations.
    pub async fn new(path: impl AsRef<Path>) -> IdentityResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under test/axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn fetch_required(&self, identity_id: Uuid) -> IdentityResult<IdentityRow> {
        let row =
            sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE identity_id = ?")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| IdentityError::NotFound(format!("identity {identity_id}")))
    }
}

/// Map a unique-constraint violation to AlreadyExists, everything else
/// through as a database error.
fn map_insert_error(err: sqlx::Error, username: &str, email: &str) -> IdentityError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return IdentityError::AlreadyExists(format!(
                "identity with username '{username}' or email '{email}'"
            ));
        }
    }
    IdentityError::Database(err)
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn create_identity(&self, identity: &NewIdentity) -> IdentityResult<IdentityRow> {
        let identity_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        // Emails are stored lowercased so the unique index is
        // case-insensitive; usernames keep their casing.
        let email = identity.email.to_lowercase();

        sqlx::query(
            r#"
            INSERT INTO identities (
                identity_id, username, email, secret_hash, refresh_token,
                display_name, avatar_id, avatar_url, cover_id, cover_url,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, NULL, ?, NULL, NULL, NULL, NULL, ?, ?)
            "#,
        )
        .bind(identity_id)
        .bind(&identity.username)
        .bind(&email)
        .bind(&identity.secret_hash)
        .bind(&identity.display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &identity.username, &identity.email))?;

        self.fetch_required(identity_id).await
    }

    async fn find_by_id(&self, identity_id: Uuid) -> IdentityResult<Option<IdentityRow>> {
        let row =
            sqlx::query_as::<_, IdentityRow>("SELECT * FROM identities WHERE identity_id = ?")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn find_by_identifier(&self, identifier: &str) -> IdentityResult<Option<IdentityRow>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT * FROM identities WHERE username = ? OR email = ?",
        )
        .bind(identifier)
        .bind(identifier.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_refresh_token(
        &self,
        identity_id: Uuid,
        refresh_token: Option<&str>,
    ) -> IdentityResult<()> {
        let result =
            sqlx::query("UPDATE identities SET refresh_token = ?, updated_at = ? WHERE identity_id = ?")
                .bind(refresh_token)
                .bind(OffsetDateTime::now_utc())
                .bind(identity_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(format!("identity {identity_id}")));
        }
        Ok(())
    }

    async fn update_display_name(
        &self,
        identity_id: Uuid,
        display_name: &str,
    ) -> IdentityResult<IdentityRow> {
        let result =
            sqlx::query("UPDATE identities SET display_name = ?, updated_at = ? WHERE identity_id = ?")
                .bind(display_name)
                .bind(OffsetDateTime::now_utc())
                .bind(identity_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(format!("identity {identity_id}")));
        }
        self.fetch_required(identity_id).await
    }

    async fn set_avatar(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow> {
        let (public_id, url) = match asset {
            Some((id, url)) => (Some(id), Some(url)),
            None => (None, None),
        };
        let result = sqlx::query(
            "UPDATE identities SET avatar_id = ?, avatar_url = ?, updated_at = ? WHERE identity_id = ?",
        )
        .bind(public_id)
        .bind(url)
        .bind(OffsetDateTime::now_utc())
        .bind(identity_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(format!("identity {identity_id}")));
        }
        self.fetch_required(identity_id).await
    }

    async fn set_cover(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow> {
        let (public_id, url) = match asset {
            Some((id, url)) => (Some(id), Some(url)),
            None => (None, None),
        };
        let result = sqlx::query(
            "UPDATE identities SET cover_id = ?, cover_url = ?, updated_at = ? WHERE identity_id = ?",
        )
        .bind(public_id)
        .bind(url)
        .bind(OffsetDateTime::now_utc())
        .bind(identity_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(format!("identity {identity_id}")));
        }
        self.fetch_required(identity_id).await
    }

    async fn migrate(&self) -> IdentityResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identities (
                identity_id   BLOB PRIMARY KEY,
                username      TEXT NOT NULL,
                email         TEXT NOT NULL,
                secret_hash   TEXT NOT NULL,
                refresh_token TEXT,
                display_name  TEXT NOT NULL,
                avatar_id     TEXT,
                avatar_url    TEXT,
                cover_id      TEXT,
                cover_url     TEXT,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_identities_username ON identities (username)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_identities_email ON identities (email)")
            .execute(&self.pool)
            .await?;

        tracing::debug!("identity schema ensured");
        Ok(())
    }

    async fn health_check(&self) -> IdentityResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
