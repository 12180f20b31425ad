//! Template lifecycle: creation with dedup, read-only duplicate checks,
//! soft deletion and listing.

use std::sync::Arc;

use canonical::{TemplateIdentity, canonicalize};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use store::{NewTemplate, StoreClient, TemplateRow};
use uuid::Uuid;

use crate::RuntimeError;

pub struct TemplateService {
    store: Arc<StoreClient>,
}

/// Creation request: identity fields plus the labels that never hash.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    pub org_id: String,
    pub workspace_id: String,
    pub name: String,
    /// Display label only, never hashed.
    pub provider: Option<String>,
    pub created_by: Option<String>,
    pub identity: TemplateIdentity,
}

/// Outcome of a read-only duplicate check.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCheck {
    pub exact_match: bool,
    pub config_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TemplateService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Hash the identity and insert under active-only uniqueness. A
    /// functional duplicate surfaces as [`store::StoreError::Duplicate`]
    /// with the existing template attached.
    pub async fn create(&self, request: CreateTemplate) -> Result<TemplateRow, RuntimeError> {
        let canonical = canonicalize(&request.identity);

        let canonical_json: Value = serde_json::from_str(&canonical.json)
            .map_err(|e| RuntimeError::Validation(format!("canonical JSON did not round-trip: {e}")))?;

        let new = NewTemplate {
            org_id: request.org_id,
            workspace_id: request.workspace_id,
            name: request.name,
            provider: request.provider,
            config_hash: canonical.config_hash,
            canonical_json,
            created_by: request.created_by,
        };

        Ok(self.store.create_template(&new).await?)
    }

    /// Same hash computation as creation, without inserting anything.
    pub async fn check_duplicate(
        &self,
        org_id: &str,
        workspace_id: &str,
        identity: &TemplateIdentity,
    ) -> Result<DuplicateCheck, RuntimeError> {
        let canonical = canonicalize(identity);

        let existing = self
            .store
            .find_active_template(org_id, workspace_id, &canonical.config_hash)
            .await?;

        Ok(match existing {
            Some(row) => DuplicateCheck {
                exact_match: true,
                config_hash: canonical.config_hash,
                template_id: Some(row.id),
                template_name: Some(row.name),
                created_at: Some(row.created_at),
            },
            None => DuplicateCheck {
                exact_match: false,
                config_hash: canonical.config_hash,
                template_id: None,
                template_name: None,
                created_at: None,
            },
        })
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), RuntimeError> {
        Ok(self.store.soft_delete_template(id).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<TemplateRow, RuntimeError> {
        Ok(self.store.get_template(id).await?)
    }

    pub async fn list(
        &self,
        workspace_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<TemplateRow>, RuntimeError> {
        Ok(self.store.list_templates(workspace_id, include_deleted).await?)
    }
}
