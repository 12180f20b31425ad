//! Integration tests against a live PostgreSQL instance.
//!
//! Ignored by default; run against a throwaway database with
//! `DATABASE_URL=postgres://localhost/brandlens_test cargo test -p store -- --ignored`.

use chrono::{Duration, SubsecRound, Utc};
use serde_json::json;
use store::{NewTemplate, StoreClient, StoreError, VersionUpsert};
use uuid::Uuid;

async fn connect() -> StoreClient {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");

    let client = StoreClient::connect(&url, 2).await.expect("connect");
    client.migrate().await.expect("migrate");
    client
}

fn new_template(workspace_id: &str, config_hash: &str) -> NewTemplate {
    NewTemplate {
        org_id: "org-test".to_owned(),
        workspace_id: workspace_id.to_owned(),
        name: "locale probe".to_owned(),
        provider: Some("openai".to_owned()),
        config_hash: config_hash.to_owned(),
        canonical_json: json!({"model_id": "gpt-5"}),
        created_by: Some("tests".to_owned()),
    }
}

#[tokio::test]
#[ignore]
async fn uniqueness_applies_to_active_templates_only() {
    let client = connect().await;
    let workspace = Uuid::new_v4().to_string();
    let hash = Uuid::new_v4().simple().to_string();

    let first = client
        .create_template(&new_template(&workspace, &hash))
        .await
        .expect("first create succeeds");

    let conflict = client
        .create_template(&new_template(&workspace, &hash))
        .await
        .expect_err("second create conflicts");

    let existing_id = match conflict {
        StoreError::Duplicate { existing } => existing.id,
        other => unreachable!("expected Duplicate, got {other:?}"),
    };
    assert_eq!(existing_id, first.id);

    client
        .soft_delete_template(first.id)
        .await
        .expect("soft delete succeeds");

    client
        .create_template(&new_template(&workspace, &hash))
        .await
        .expect("create after soft delete succeeds");
}

#[tokio::test]
#[ignore]
async fn version_upsert_converges_on_one_row() {
    let client = connect().await;
    let workspace = Uuid::new_v4().to_string();
    let hash = Uuid::new_v4().simple().to_string();

    let template = client
        .create_template(&new_template(&workspace, &hash))
        .await
        .expect("create template");

    // Postgres keeps microseconds; truncate so round-tripped values compare.
    let earlier = Utc::now().trunc_subsecs(6);
    let later = earlier + Duration::minutes(5);

    let mut upsert = VersionUpsert {
        template_id: template.id,
        org_id: template.org_id.clone(),
        workspace_id: template.workspace_id.clone(),
        provider: "openai".to_owned(),
        provider_version_key: "fp_test_abc".to_owned(),
        model_id: "gpt-5".to_owned(),
        captured_at: earlier,
    };

    let first = client.upsert_version(&upsert).await.expect("first upsert");

    upsert.captured_at = later;
    let second = client.upsert_version(&upsert).await.expect("second upsert");

    assert_eq!(first.id, second.id, "concurrent observers share one row");
    assert_eq!(second.last_seen_at, later);
    assert_eq!(second.first_seen_at, first.first_seen_at);

    // An observation older than the stored one never rewinds last_seen_at.
    upsert.captured_at = earlier - Duration::minutes(10);
    let third = client.upsert_version(&upsert).await.expect("third upsert");
    assert_eq!(third.last_seen_at, later);
}

#[tokio::test]
#[ignore]
async fn soft_deleted_templates_remain_queryable() {
    let client = connect().await;
    let workspace = Uuid::new_v4().to_string();
    let hash = Uuid::new_v4().simple().to_string();

    let template = client
        .create_template(&new_template(&workspace, &hash))
        .await
        .expect("create template");

    client.soft_delete_template(template.id).await.expect("delete");

    let fetched = client.get_template(template.id).await.expect("still fetchable");
    assert!(fetched.deleted_at.is_some());

    let active_only = client.list_templates(&workspace, false).await.expect("list");
    assert!(active_only.is_empty());

    let with_deleted = client.list_templates(&workspace, true).await.expect("list");
    assert_eq!(with_deleted.len(), 1);
}
