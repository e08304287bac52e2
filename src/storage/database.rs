//! Database connection and query execution

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::query::{BindValue, QuerySpec};

use super::schema::init_schema;

type BoundQueryAs<'q, O> = sqlx::query::QueryAs<'q, Sqlite, O, SqliteArguments<'q>>;

/// One page of rows plus the number of rows matching the filters
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

/// SQLite connection pool
#[derive(Clone)]
pub struct Database {
    pub(super) pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self> {
        info!(path = %db_path, "Initializing database");

        if let Some(parent) = Path::new(db_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            info!(directory = %parent.display(), "Creating database directory");
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(with_pragmas(options))
            .await
            .context("Failed to open SQLite database")?;

        Self::init(pool).await
    }

    /// Single-connection in-memory database
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory database URL")?;
        // Every connection would get its own empty memory database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(with_pragmas(options))
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self> {
        let sqlite_version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        debug!(sqlite_version = %sqlite_version, "SQLite version");

        init_schema(&pool).await?;

        info!(sqlite_version = %sqlite_version, "Database initialized successfully");
        Ok(Self { pool })
    }

    /// Run a composed query and a COUNT(*) over the same filters
    pub async fn fetch_page<T>(&self, spec: &QuerySpec) -> Result<Page<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let (sql, binds) = spec.to_sql();
        debug!(sql = %sql, binds = binds.len(), "Executing query");
        let rows = bind_all(sqlx::query_as::<_, T>(&sql), &binds)
            .fetch_all(&self.pool)
            .await
            .context("Failed to execute query")?;

        let (count_sql, count_binds) = spec.to_count_sql();
        let (total,): (i64,) = bind_all(sqlx::query_as(&count_sql), &count_binds)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count rows")?;

        Ok(Page { rows, total })
    }

    /// Look up the account owning an organization id
    pub async fn account_id_for_org(&self, org_id: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar("SELECT id FROM account WHERE org_id = ?")
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up account")?;
        Ok(id)
    }
}

fn with_pragmas(options: SqliteConnectOptions) -> SqliteConnectOptions {
    // Substring search is case-sensitive
    options
        .pragma("case_sensitive_like", "ON")
        .foreign_keys(true)
}

fn bind_all<'q, O>(query: BoundQueryAs<'q, O>, binds: &[BindValue]) -> BoundQueryAs<'q, O> {
    binds.iter().fold(query, |query, value| match value {
        BindValue::Text(text) => query.bind(text.clone()),
        BindValue::Real(real) => query.bind(*real),
        BindValue::Integer(integer) => query.bind(*integer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures;

    #[derive(Debug, sqlx::FromRow)]
    struct NameRow {
        name: String,
    }

    #[tokio::test]
    async fn test_database_in_memory() {
        let db = Database::in_memory().await.expect("Failed to create in-memory database");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cve")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_database_file_created() {
        let dir = std::env::temp_dir().join(format!("cve-manager-test-{}", std::process::id()));
        let path = dir.join("nested").join("test.db");
        let db = Database::new(path.to_str().unwrap(), 2).await.unwrap();
        assert!(path.exists());
        drop(db);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_account_lookup() {
        let db = Database::in_memory().await.unwrap();
        let id = fixtures::account(&db, "org-1").await;
        assert_eq!(db.account_id_for_org("org-1").await.unwrap(), Some(id));
        assert_eq!(db.account_id_for_org("org-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_page_binds_in_order() {
        let db = Database::in_memory().await.unwrap();
        fixtures::seed_sample(&db).await;

        let spec = QuerySpec::new("cve.name", "cve")
            .filter(crate::query::Condition::new(
                "cve.severity = ?",
                vec![BindValue::Text("critical".to_string())],
            ))
            .order_by(crate::query::OrderClause::new("cve.name", false))
            .limit(1);
        let page: Page<NameRow> = db.fetch_page(&spec).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "CVE-2022-0001");
    }

    #[tokio::test]
    async fn test_like_is_case_sensitive() {
        let db = Database::in_memory().await.unwrap();
        fixtures::seed_sample(&db).await;

        let spec = QuerySpec::new("cve.name", "cve").filter(crate::query::Condition::new(
            "cve.name LIKE ?",
            vec![BindValue::Text("%cve-2022%".to_string())],
        ));
        let page: Page<NameRow> = db.fetch_page(&spec).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
