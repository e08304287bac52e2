//! Database schema initialization

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_number TEXT,
    org_id TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS cluster (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    version TEXT NOT NULL,
    provider TEXT,
    account_id INTEGER NOT NULL REFERENCES account (id)
);

CREATE TABLE IF NOT EXISTS image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pyxis_id TEXT NOT NULL UNIQUE,
    digest TEXT NOT NULL UNIQUE,
    modified_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cve (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    severity TEXT NOT NULL
        CHECK (severity IN ('none', 'low', 'moderate', 'important', 'critical')),
    cvss3_score REAL,
    cvss3_metrics TEXT,
    cvss2_score REAL,
    cvss2_metrics TEXT,
    public_date TEXT,
    modified_date TEXT,
    redhat_url TEXT,
    secondary_url TEXT
);

CREATE TABLE IF NOT EXISTS image_cve (
    image_id INTEGER NOT NULL REFERENCES image (id),
    cve_id INTEGER NOT NULL REFERENCES cve (id),
    UNIQUE (image_id, cve_id)
);

CREATE TABLE IF NOT EXISTS cluster_image (
    cluster_id INTEGER NOT NULL REFERENCES cluster (id),
    image_id INTEGER NOT NULL REFERENCES image (id),
    UNIQUE (cluster_id, image_id)
);

CREATE INDEX IF NOT EXISTS idx_cluster_account_id ON cluster (account_id);
CREATE INDEX IF NOT EXISTS idx_image_cve_cve_id ON image_cve (cve_id);
CREATE INDEX IF NOT EXISTS idx_cluster_image_image_id ON cluster_image (image_id);
CREATE INDEX IF NOT EXISTS idx_cve_severity ON cve (severity);
"#;

/// Create tables and indexes that do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    debug!("Initializing database schema");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'cve'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(false);

    if table_exists {
        debug!("Schema already present, checking for missing objects");
    } else {
        info!("Creating new database schema");
    }

    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to initialize database schema")?;

    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(0);

    debug!(tables = table_count, "Database schema initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        super::init_schema(&db.pool).await.expect("second init should succeed");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&db.pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec!["account", "cluster", "cluster_image", "cve", "image", "image_cve"]
        );
    }

    #[tokio::test]
    async fn test_severity_check_constraint() {
        let db = Database::in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO cve (name, description, severity) VALUES ('CVE-X', 'x', 'high')",
        )
        .execute(&db.pool)
        .await;
        assert!(result.is_err());
    }
}
