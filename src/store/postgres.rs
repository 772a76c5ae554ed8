use super::{StoreError, UserRecord, UserStore};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgPool, Row,
};
use std::time::Duration;
use tracing::{info_span, Instrument};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/sql/schema.sql"));

/// Postgres-backed store; the `users.username` primary key makes inserts race-safe.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the `users` table exists.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the schema cannot be applied.
    pub async fn connect(dsn: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply `db/sql/schema.sql`; every statement is idempotent.
    ///
    /// # Errors
    /// Returns an error if a statement fails.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let query =
            "SELECT username, created_at, salt, hashed_password FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|e| {
                StoreError::Internal(anyhow::Error::new(e).context("failed to fetch user"))
            })?;

        row.as_ref()
            .map(decode_user)
            .transpose()
            .map_err(|e| {
                StoreError::Internal(anyhow::Error::new(e).context("failed to decode user row"))
            })
    }

    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let query = "INSERT INTO users (username, created_at, salt, hashed_password) VALUES ($1, $2, $3, $4)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        match sqlx::query(query)
            .bind(&record.username)
            .bind(record.created_at)
            .bind(&record.salt)
            .bind(&record.hashed_password)
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(StoreError::Internal(
                anyhow::Error::new(err).context("failed to insert user"),
            )),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(|e| StoreError::Internal(e.into()))?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .map_err(|e| StoreError::Internal(e.into()))
    }
}

fn decode_user(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
        salt: row.try_get("salt")?,
        hashed_password: row.try_get("hashed_password")?,
    })
}

/// SQLSTATE 23505: the insert hit an existing primary key.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');
        if trimmed.ends_with(';') {
            statements.push(current.trim().trim_end_matches(';').to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}
