use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{StoreClient, StoreError, is_unique_violation};

/// A stored template: identity hash plus the non-identity attributes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub org_id: String,
    pub workspace_id: String,
    pub name: String,
    /// Display label only; never part of the identity hash.
    pub provider: Option<String>,
    pub config_hash: String,
    pub canonical_json: Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for template creation. The hash and canonical JSON are computed
/// by the caller from the identity fields.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub org_id: String,
    pub workspace_id: String,
    pub name: String,
    pub provider: Option<String>,
    pub config_hash: String,
    pub canonical_json: Value,
    pub created_by: Option<String>,
}

impl StoreClient {
    /// Insert a template under the active-only uniqueness constraint.
    /// A conflict returns [`StoreError::Duplicate`] carrying the existing
    /// active row.
    pub async fn create_template(&self, new: &NewTemplate) -> Result<TemplateRow, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            INSERT INTO prompt_templates
                (id, org_id, workspace_id, name, provider, config_hash, canonical_json, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, org_id, workspace_id, name, provider, config_hash, canonical_json,
                      created_by, created_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.org_id)
        .bind(&new.workspace_id)
        .bind(&new.name)
        .bind(&new.provider)
        .bind(&new.config_hash)
        .bind(&new.canonical_json)
        .bind(&new.created_by)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await;

        match row {
            Ok(row) => Ok(row),
            Err(error) if is_unique_violation(&error) => {
                let existing = self
                    .find_active_template(&new.org_id, &new.workspace_id, &new.config_hash)
                    .await?
                    .ok_or_else(|| StoreError::Query(error.to_string()))?;

                Err(StoreError::Duplicate {
                    existing: Box::new(existing),
                })
            }
            Err(error) => Err(StoreError::Query(error.to_string())),
        }
    }

    /// Active template with the given identity hash, if one exists.
    pub async fn find_active_template(
        &self,
        org_id: &str,
        workspace_id: &str,
        config_hash: &str,
    ) -> Result<Option<TemplateRow>, StoreError> {
        sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, org_id, workspace_id, name, provider, config_hash, canonical_json,
                   created_by, created_at, deleted_at
            FROM prompt_templates
            WHERE org_id = $1 AND workspace_id = $2 AND config_hash = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(org_id)
        .bind(workspace_id)
        .bind(config_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Retrieve a template by id, deleted or not.
    pub async fn get_template(&self, id: Uuid) -> Result<TemplateRow, StoreError> {
        sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, org_id, workspace_id, name, provider, config_hash, canonical_json,
                   created_by, created_at, deleted_at
            FROM prompt_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound(format!("template {id}")))
    }

    /// Soft delete: set `deleted_at`, freeing the identity hash for new
    /// templates. Versions and results stay queryable. Idempotent.
    pub async fn soft_delete_template(&self, id: Uuid) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE prompt_templates
            SET deleted_at = COALESCE(deleted_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("template {id}")));
        }

        Ok(())
    }

    /// Templates in a workspace, newest first.
    pub async fn list_templates(
        &self,
        workspace_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<TemplateRow>, StoreError> {
        sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, org_id, workspace_id, name, provider, config_hash, canonical_json,
                   created_by, created_at, deleted_at
            FROM prompt_templates
            WHERE workspace_id = $1 AND (deleted_at IS NULL OR $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(workspace_id)
        .bind(include_deleted)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::Query(e.to_string()))
    }
}
