//! Test data helpers

use super::database::Database;

/// Ids of the two accounts seeded by [`seed_sample`]
pub struct Sample {
    pub account_id: i64,
    pub other_account_id: i64,
}

pub async fn account(db: &Database, org_id: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO account (account_number, org_id) VALUES (?, ?) RETURNING id")
        .bind(format!("acct-{}", org_id))
        .bind(org_id)
        .fetch_one(&db.pool)
        .await
        .expect("Failed to insert account")
}

pub async fn cluster(db: &Database, account_id: i64, uuid: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO cluster (uuid, status, version, provider, account_id) VALUES (?, 'Ready', '4.12', 'AWS', ?) RETURNING id",
    )
    .bind(uuid)
    .bind(account_id)
    .fetch_one(&db.pool)
    .await
    .expect("Failed to insert cluster")
}

pub async fn image(db: &Database, name: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO image (pyxis_id, digest, modified_date) VALUES (?, ?, '2022-01-01T00:00:00Z') RETURNING id",
    )
    .bind(name)
    .bind(format!("sha256:{}", name))
    .fetch_one(&db.pool)
    .await
    .expect("Failed to insert image")
}

pub async fn cve(
    db: &Database,
    name: &str,
    description: &str,
    severity: &str,
    cvss3_score: Option<f64>,
    cvss2_score: Option<f64>,
    public_date: Option<&str>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO cve (name, description, severity, cvss3_score, cvss2_score, public_date) VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(description)
    .bind(severity)
    .bind(cvss3_score)
    .bind(cvss2_score)
    .bind(public_date)
    .fetch_one(&db.pool)
    .await
    .expect("Failed to insert cve")
}

pub async fn link_cluster_image(db: &Database, cluster_id: i64, image_id: i64) {
    sqlx::query("INSERT INTO cluster_image (cluster_id, image_id) VALUES (?, ?)")
        .bind(cluster_id)
        .bind(image_id)
        .execute(&db.pool)
        .await
        .expect("Failed to link cluster and image");
}

pub async fn link_image_cve(db: &Database, image_id: i64, cve_id: i64) {
    sqlx::query("INSERT INTO image_cve (image_id, cve_id) VALUES (?, ?)")
        .bind(image_id)
        .bind(cve_id)
        .execute(&db.pool)
        .await
        .expect("Failed to link image and cve");
}

/// Two accounts sharing one vulnerable image.
///
/// | CVE           | severity  | cvss3 | cvss2 | published  | images     |
/// |---------------|-----------|-------|-------|------------|------------|
/// | CVE-2022-0001 | critical  | 9.01  |       | 2022-01-10 | img-1, img-2 |
/// | CVE-2022-0002 | important | 9.0   |       | 2022-03-15 | img-2      |
/// | CVE-2021-0003 | low       |       | 4.3   | 2021-06-01 | img-3      |
///
/// Account `org-1` runs cluster-a (img-1, img-3), cluster-b (img-2) and an empty
/// cluster-d. Account `org-2` runs cluster-c (img-1).
pub async fn seed_sample(db: &Database) -> Sample {
    let account_id = account(db, "org-1").await;
    let other_account_id = account(db, "org-2").await;

    let cluster_a = cluster(db, account_id, "cluster-a").await;
    let cluster_b = cluster(db, account_id, "cluster-b").await;
    let cluster_c = cluster(db, other_account_id, "cluster-c").await;
    cluster(db, account_id, "cluster-d").await;

    let img_1 = image(db, "img-1").await;
    let img_2 = image(db, "img-2").await;
    let img_3 = image(db, "img-3").await;

    let cve_1 = cve(
        db,
        "CVE-2022-0001",
        "Heap overflow in libxml2",
        "critical",
        Some(9.01),
        None,
        Some("2022-01-10T00:00:00+00:00"),
    )
    .await;
    let cve_2 = cve(
        db,
        "CVE-2022-0002",
        "Buffer over-read in openssl",
        "important",
        Some(9.0),
        None,
        Some("2022-03-15T10:30:00+00:00"),
    )
    .await;
    let cve_3 = cve(
        db,
        "CVE-2021-0003",
        "Denial of service in zlib",
        "low",
        None,
        Some(4.3),
        Some("2021-06-01T00:00:00+00:00"),
    )
    .await;

    link_image_cve(db, img_1, cve_1).await;
    link_image_cve(db, img_2, cve_1).await;
    link_image_cve(db, img_2, cve_2).await;
    link_image_cve(db, img_3, cve_3).await;

    link_cluster_image(db, cluster_a, img_1).await;
    link_cluster_image(db, cluster_a, img_3).await;
    link_cluster_image(db, cluster_b, img_2).await;
    link_cluster_image(db, cluster_c, img_1).await;

    Sample {
        account_id,
        other_account_id,
    }
}
