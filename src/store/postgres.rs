use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::model::{ComparisonSession, Id};
use crate::store::traits::SessionStore;

const CREATE_SESSIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS comparison_sessions (
        seq BIGSERIAL,
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        endpoint TEXT NOT NULL,
        created_at TEXT NOT NULL,
        total_differences INTEGER NOT NULL,
        data BYTEA NOT NULL,
        data_size BIGINT NOT NULL
    )
"#;

const CREATE_ACTIVE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS active_comparison_session (
        singleton BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (singleton),
        session_id TEXT REFERENCES comparison_sessions(id) ON DELETE SET NULL
    )
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the session tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_SESSIONS_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create comparison_sessions table")?;
        sqlx::query(CREATE_ACTIVE_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create active_comparison_session table")?;
        log::info!("Session tables ready");
        Ok(())
    }
}

/// Serialize and gzip a session for the `data` column
pub fn encode_session(session: &ComparisonSession) -> Result<(Vec<u8>, i64)> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let serialized = serde_json::to_vec(session).context("Failed to serialize session")?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&serialized)
        .context("Failed to compress session")?;
    let compressed = encoder.finish().context("Failed to compress session")?;
    Ok((compressed, serialized.len() as i64))
}

/// Inverse of [`encode_session`]
pub fn decode_session(data: &[u8]) -> Result<ComparisonSession> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .context("Failed to decompress session data")?;
    serde_json::from_slice(&decompressed).context("Failed to deserialize session data")
}

#[async_trait::async_trait]
impl SessionStore for PostgresStore {
    async fn create_session(&self, session: ComparisonSession) -> Result<ComparisonSession> {
        let (data, data_size) = encode_session(&session)?;
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO comparison_sessions
                (id, name, endpoint, created_at, total_differences, data, data_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&session.id)
        .bind(&session.name)
        .bind(&session.endpoint)
        .bind(&session.timestamp)
        .bind(session.summary.total_differences as i32)
        .bind(&data)
        .bind(data_size)
        .execute(&mut *tx)
        .await
        .context("Failed to insert session")?;

        sqlx::query(
            r#"
            INSERT INTO active_comparison_session (singleton, session_id)
            VALUES (TRUE, $1)
            ON CONFLICT (singleton) DO UPDATE SET session_id = EXCLUDED.session_id
            "#,
        )
        .bind(&session.id)
        .execute(&mut *tx)
        .await
        .context("Failed to mark session active")?;

        tx.commit().await.context("Failed to commit session")?;
        Ok(session)
    }

    async fn get_session(&self, id: &Id) -> Result<Option<ComparisonSession>> {
        let row = sqlx::query("SELECT data FROM comparison_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch session")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: Vec<u8> = row.get("data");
        decode_session(&data).map(Some)
    }

    async fn list_sessions(&self) -> Result<Vec<ComparisonSession>> {
        let rows = sqlx::query("SELECT data FROM comparison_sessions ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sessions")?;

        rows.into_iter()
            .map(|row| {
                let data: Vec<u8> = row.get("data");
                decode_session(&data)
            })
            .collect()
    }

    async fn delete_session(&self, id: &Id) -> Result<bool> {
        // The active pointer is cleared by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM comparison_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_active_session(&self) -> Result<Option<ComparisonSession>> {
        let row = sqlx::query(
            r#"
            SELECT s.data FROM active_comparison_session a
            JOIN comparison_sessions s ON s.id = a.session_id
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active session")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: Vec<u8> = row.get("data");
        decode_session(&data).map(Some)
    }

    async fn set_active_session(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO active_comparison_session (singleton, session_id)
            SELECT TRUE, id FROM comparison_sessions WHERE id = $1
            ON CONFLICT (singleton) DO UPDATE SET session_id = EXCLUDED.session_id
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to set active session")?;

        Ok(result.rows_affected() > 0)
    }
}
