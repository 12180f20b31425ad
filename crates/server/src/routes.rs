//! Route handlers for the template, run, version and introspection
//! operation families.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_serde::Sonic;
use canonical::TemplateIdentity;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use llm::ProviderKind;
use runtime::{CreateTemplate, RunParams};

use crate::{AppState, error::ApiResult};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTemplateRequest {
    pub org_id: String,
    pub workspace_id: String,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub identity: TemplateIdentity,
}

pub(crate) async fn create_template(
    State(state): State<Arc<AppState>>,
    Sonic(request): Sonic<CreateTemplateRequest>,
) -> ApiResult<impl IntoResponse> {
    log::debug!(
        "create template '{}' in workspace {}",
        request.name,
        request.workspace_id
    );

    let row = state
        .templates
        .create(CreateTemplate {
            org_id: request.org_id,
            workspace_id: request.workspace_id,
            name: request.name,
            provider: request.provider,
            created_by: request.created_by,
            identity: request.identity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckDuplicateRequest {
    pub org_id: String,
    pub workspace_id: String,
    pub identity: TemplateIdentity,
}

pub(crate) async fn check_duplicate(
    State(state): State<Arc<AppState>>,
    Sonic(request): Sonic<CheckDuplicateRequest>,
) -> ApiResult<impl IntoResponse> {
    let check = state
        .templates
        .check_duplicate(&request.org_id, &request.workspace_id, &request.identity)
        .await?;

    Ok(Json(check))
}

pub(crate) async fn soft_delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.templates.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListTemplatesQuery {
    pub workspace_id: String,
    #[serde(default)]
    pub include_deleted: bool,
}

pub(crate) async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTemplatesQuery>,
) -> ApiResult<impl IntoResponse> {
    let rows = state
        .templates
        .list(&query.workspace_id, query.include_deleted)
        .await?;

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunTemplateRequest {
    pub brand: String,
    pub countries: Vec<String>,
    pub grounding_modes: Vec<llm::GroundingMode>,
}

pub(crate) async fn run_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Sonic(request): Sonic<RunTemplateRequest>,
) -> ApiResult<impl IntoResponse> {
    let template = state.templates.get(id).await?;

    log::info!(
        "running template {id} for brand '{}' over {} countries",
        request.brand,
        request.countries.len()
    );

    let report = state
        .dispatcher
        .run_template(
            &template,
            &RunParams {
                brand: request.brand,
                countries: request.countries,
                grounding_modes: request.grounding_modes,
            },
        )
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct EnsureVersionRequest {
    /// Defaults to the provider inferred from the template's model id.
    #[serde(default)]
    pub provider: Option<String>,
    /// Defaults to the template's model id.
    #[serde(default)]
    pub model_id: Option<String>,
}

pub(crate) async fn ensure_version(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Sonic(request): Sonic<EnsureVersionRequest>,
) -> ApiResult<impl IntoResponse> {
    let template = state.templates.get(id).await?;

    let identity: TemplateIdentity = serde_json::from_value(template.canonical_json.clone())
        .map_err(|e| runtime::RuntimeError::Validation(format!("stored identity unreadable: {e}")))?;

    let model_id = request.model_id.unwrap_or_else(|| identity.model_id.clone());

    let provider = match &request.provider {
        Some(label) => ProviderKind::parse_label(label)
            .ok_or_else(|| runtime::RuntimeError::Validation(format!("unknown provider '{label}'")))?,
        None => ProviderKind::infer(&model_id),
    };

    let ensured = state
        .versions
        .ensure_version(&template, provider, &model_id, None)
        .await?;

    Ok(Json(ensured))
}

pub(crate) async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = state.store.get_result(id).await.map_err(crate::error::ApiError::from)?;
    Ok(Json(row))
}

/// Adapter availability plus a one-token smoke test per provider.
pub(crate) async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let adapters = state.orchestrator.health().await;
    let database = state.store.health_check().await.is_ok();

    let healthy = database && adapters.iter().all(|adapter| adapter.healthy);
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "database": database,
            "adapters": adapters,
        })),
    )
}
