//! Run expansion and execution.
//!
//! One template expands into the Cartesian product of countries and
//! grounding modes. Steps run with bounded parallelism and complete in
//! any order; each persists its own result row. REQUIRED-grounding and
//! deadline failures become failure rows; transport errors are reported
//! back without a row so the caller can retry.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use canonical::TemplateIdentity;
use futures::StreamExt;
use itertools::iproduct;
use llm::{ErrorKind, GroundingMode, LlmError, Orchestrator, RunRequest, RunResult};
use serde::Serialize;
use serde_json::Value;
use store::{NewResult, ResultRow, StoreClient, TemplateRow};
use uuid::Uuid;

use crate::{RuntimeError, VersionService};

/// Country code that suppresses the ALS block (control condition).
pub const NO_ALS_SENTINEL: &str = "NONE";

/// Runtime parameters for one expansion.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub brand: String,
    /// ISO-3166 alpha-2 codes, or [`NO_ALS_SENTINEL`].
    pub countries: Vec<String>,
    pub grounding_modes: Vec<GroundingMode>,
}

/// Expansion outcome: persisted rows (successes and recorded failures)
/// plus the steps that produced no row.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub results: Vec<ResultRow>,
    pub skipped: Vec<SkippedStep>,
}

/// A step that errored without leaving an audit row.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedStep {
    pub country: String,
    pub grounding_mode: GroundingMode,
    pub error_kind: String,
    pub message: String,
}

enum StepOutcome {
    Persisted(Box<ResultRow>),
    Skipped(SkippedStep),
}

pub struct RunDispatcher {
    store: Arc<StoreClient>,
    orchestrator: Arc<Orchestrator>,
    versions: Arc<VersionService>,
    run_config: config::RunConfig,
}

impl RunDispatcher {
    pub fn new(
        store: Arc<StoreClient>,
        orchestrator: Arc<Orchestrator>,
        versions: Arc<VersionService>,
        run_config: config::RunConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            versions,
            run_config,
        }
    }

    /// Expand and execute a template. Steps complete out of order; the
    /// report collects rows in completion order.
    pub async fn run_template(
        &self,
        template: &TemplateRow,
        params: &RunParams,
    ) -> Result<RunReport, RuntimeError> {
        if params.countries.is_empty() || params.grounding_modes.is_empty() {
            return Err(RuntimeError::Validation(
                "countries and grounding_modes must be non-empty".to_owned(),
            ));
        }

        let identity: TemplateIdentity = serde_json::from_value(template.canonical_json.clone())
            .map_err(|e| RuntimeError::Validation(format!("stored canonical identity is unreadable: {e}")))?;

        let steps: Vec<(String, GroundingMode)> =
            iproduct!(params.countries.iter(), params.grounding_modes.iter())
                .map(|(country, mode)| (country.clone(), *mode))
                .collect();

        log::info!(
            "expanding template {} into {} steps ({} countries x {} modes)",
            template.id,
            steps.len(),
            params.countries.len(),
            params.grounding_modes.len()
        );

        let outcomes: Vec<StepOutcome> = futures::stream::iter(steps)
            .map(|(country, mode)| self.execute_step(template, &identity, params, country, mode))
            .buffer_unordered(self.run_config.max_parallel.max(1))
            .collect()
            .await;

        let mut report = RunReport {
            results: Vec::new(),
            skipped: Vec::new(),
        };

        for outcome in outcomes {
            match outcome {
                StepOutcome::Persisted(row) => report.results.push(*row),
                StepOutcome::Skipped(step) => report.skipped.push(step),
            }
        }

        Ok(report)
    }

    async fn execute_step(
        &self,
        template: &TemplateRow,
        identity: &TemplateIdentity,
        params: &RunParams,
        country: String,
        mode: GroundingMode,
    ) -> StepOutcome {
        let request = match build_request(identity, params, &country, mode, &self.run_config) {
            Ok(request) => request,
            Err(error) => {
                return StepOutcome::Skipped(SkippedStep {
                    country,
                    grounding_mode: mode,
                    error_kind: ErrorKind::ValidationError.as_str().to_owned(),
                    message: error.to_string(),
                });
            }
        };

        let request_json = serde_json::to_value(&request).unwrap_or(Value::Null);
        let run_id = request.run_id;

        match self.orchestrator.execute(request.clone()).await {
            Ok(result) => {
                self.persist_success(template, identity, &request, request_json, &country, mode, result)
                    .await
            }
            Err(error) => {
                self.record_failure(template, request_json, run_id, &country, mode, error)
                    .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist_success(
        &self,
        template: &TemplateRow,
        identity: &TemplateIdentity,
        request: &RunRequest,
        request_json: Value,
        country: &str,
        mode: GroundingMode,
        result: RunResult,
    ) -> StepOutcome {
        // Version hook: prefer the key the response carried; the service
        // falls back to its canonical value, so "unknown" never leaks into
        // the audit row.
        let observed_key = result.provider_version_key();
        let ensured = self
            .versions
            .ensure_version(template, request.provider(), &identity.model_id, observed_key.as_deref())
            .await;

        let (version_id, provider_version_key) = match ensured {
            Ok(version) => (Some(version.version_id), Some(version.provider_version_key)),
            Err(error) => {
                log::warn!("version capture failed for template {}: {error}", template.id);
                (None, observed_key)
            }
        };

        let probe_evaluation = evaluate_response(template, identity, request, country, &result);

        let new = NewResult {
            template_id: template.id,
            version_id,
            run_id: Some(request.run_id),
            country: Some(country.to_owned()),
            grounding_mode: Some(mode.to_string()),
            provider_version_key,
            system_fingerprint: result.system_fingerprint.clone(),
            request: request_json,
            response: serde_json::to_value(&result).ok(),
            analysis_config: None,
            grounded_effective: result.grounded_effective,
            tool_call_count: result.tool_call_count as i32,
            citations: serde_json::to_value(&result.citations).unwrap_or_else(|_| Value::Array(Vec::new())),
            json_valid: result.json_valid,
            latency_ms: result.latency_ms as i64,
            error_kind: None,
            error_message: None,
            probe_evaluation,
        };

        match self.store.insert_result(&new).await {
            Ok(row) => StepOutcome::Persisted(Box::new(row)),
            Err(error) => StepOutcome::Skipped(SkippedStep {
                country: country.to_owned(),
                grounding_mode: mode,
                error_kind: "store_error".to_owned(),
                message: error.to_string(),
            }),
        }
    }

    /// REQUIRED-grounding and deadline failures leave an audit row and the
    /// expansion continues. Everything else (transport, validation) skips
    /// the row so the caller can retry the step.
    async fn record_failure(
        &self,
        template: &TemplateRow,
        request_json: Value,
        run_id: Uuid,
        country: &str,
        mode: GroundingMode,
        error: LlmError,
    ) -> StepOutcome {
        let kind = error.kind();

        let leaves_row = matches!(kind, ErrorKind::GroundingRequiredError | ErrorKind::DeadlineExceeded);

        if !leaves_row {
            return StepOutcome::Skipped(SkippedStep {
                country: country.to_owned(),
                grounding_mode: mode,
                error_kind: kind.as_str().to_owned(),
                message: error.client_message(),
            });
        }

        let mut failure = NewResult::failure(
            template.id,
            run_id,
            request_json,
            kind.as_str(),
            error.client_message(),
        );
        failure.country = Some(country.to_owned());
        failure.grounding_mode = Some(mode.to_string());

        match self.store.insert_result(&failure).await {
            Ok(row) => StepOutcome::Persisted(Box::new(row)),
            Err(store_error) => StepOutcome::Skipped(SkippedStep {
                country: country.to_owned(),
                grounding_mode: mode,
                error_kind: kind.as_str().to_owned(),
                message: format!("{} (failure row not written: {store_error})", error.client_message()),
            }),
        }
    }
}

/// Assemble the RunRequest for one expansion step.
fn build_request(
    identity: &TemplateIdentity,
    params: &RunParams,
    country: &str,
    mode: GroundingMode,
    run_config: &config::RunConfig,
) -> Result<RunRequest, RuntimeError> {
    let user_prompt = identity.user_prompt_template.replace("{{brand}}", &params.brand);

    let (als_block, system_text) = if country.eq_ignore_ascii_case(NO_ALS_SENTINEL) {
        (None, identity.system_instructions.clone())
    } else {
        let locale = als::Locale::from_str(country)?;
        let block = als::build_block(locale)?;

        (
            Some(block),
            als::compose_system_text(&identity.system_instructions),
        )
    };

    let mut request = RunRequest::new(identity.model_id.clone(), user_prompt);
    request.system_text = system_text;
    request.als_block = als_block;
    request.grounding_mode = mode;
    request.temperature = inference_f64(identity, "temperature");
    request.top_p = inference_f64(identity, "top_p");
    request.seed = inference_u64(identity, "seed");
    request.response_schema = response_schema(identity);
    request.tools_spec = identity.tools_spec.clone();
    request.hard_deadline = Duration::from_secs(run_config.hard_deadline_secs);
    request.grounded_soft_deadline = Duration::from_secs(run_config.grounded_soft_deadline_secs);

    Ok(request)
}

fn inference_f64(identity: &TemplateIdentity, key: &str) -> Option<f64> {
    identity
        .inference_params
        .as_ref()
        .and_then(|params| params.get(key))
        .and_then(Value::as_f64)
}

fn inference_u64(identity: &TemplateIdentity, key: &str) -> Option<u64> {
    identity
        .inference_params
        .as_ref()
        .and_then(|params| params.get(key))
        .and_then(Value::as_u64)
}

/// The enforced schema is the `schema` member of `response_format`;
/// other response-format dialects pass through unenforced.
fn response_schema(identity: &TemplateIdentity) -> Option<Value> {
    identity
        .response_format
        .as_ref()
        .and_then(|format| format.get("schema"))
        .cloned()
}

/// A template counts as a locale probe when its name says so or its
/// prompt asks for the civic triple.
fn is_locale_probe(template_name: &str, user_prompt_template: &str) -> bool {
    if template_name.to_lowercase().contains("probe") {
        return true;
    }

    let prompt = user_prompt_template.to_lowercase();
    prompt.contains("vat") && (prompt.contains("plug") || prompt.contains("emergency"))
}

/// Post-response analysis: locale-probe evaluation for probe templates
/// plus ALS leak detection whenever a block was shown.
fn evaluate_response(
    template: &TemplateRow,
    identity: &TemplateIdentity,
    request: &RunRequest,
    country: &str,
    result: &RunResult,
) -> Option<Value> {
    let mut analysis = serde_json::Map::new();

    if !country.eq_ignore_ascii_case(NO_ALS_SENTINEL)
        && is_locale_probe(&template.name, &identity.user_prompt_template)
    {
        let evaluation = locale_probe::evaluate(&result.text, country);
        if let Ok(value) = serde_json::to_value(&evaluation) {
            analysis.insert("locale_probe".to_owned(), value);
        }
    }

    if let Some(block) = &request.als_block {
        let leak = als::detect_leak(&block.text, &result.text);
        if let Ok(value) = serde_json::to_value(&leak) {
            analysis.insert("leak".to_owned(), value);
        }
    }

    if analysis.is_empty() {
        None
    } else {
        Some(Value::Object(analysis))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn probe_identity() -> TemplateIdentity {
        TemplateIdentity {
            system_instructions: "Antworte knapp.".to_owned(),
            user_prompt_template: "Nenne als JSON: VAT, Stecker (plug) und Notrufnummern (emergency)."
                .to_owned(),
            country_set: vec!["CH".to_owned(), "DE".to_owned()],
            model_id: "gemini-2.5-pro".to_owned(),
            inference_params: Some(json!({"temperature": 0.3, "top_p": 0.9, "seed": 7})),
            tools_spec: None,
            response_format: Some(json!({"schema": {"type": "object"}})),
            grounding_profile_id: None,
            grounding_snapshot_id: None,
            retrieval_params: None,
        }
    }

    fn params() -> RunParams {
        RunParams {
            brand: "Aurora Coffee".to_owned(),
            countries: vec!["CH".to_owned()],
            grounding_modes: vec![GroundingMode::Required],
        }
    }

    #[test]
    fn brand_placeholder_is_rendered() {
        let identity = TemplateIdentity {
            user_prompt_template: "What do you know about {{brand}}?".to_owned(),
            ..probe_identity()
        };

        let request = build_request(&identity, &params(), "CH", GroundingMode::Off, &config::RunConfig::default())
            .unwrap();

        assert_eq!(request.user_prompt, "What do you know about Aurora Coffee?");
    }

    #[test]
    fn supported_country_gets_an_als_turn_and_the_augmented_system_text() {
        let request = build_request(
            &probe_identity(),
            &params(),
            "CH",
            GroundingMode::Required,
            &config::RunConfig::default(),
        )
        .unwrap();

        let block = request.als_block.expect("CH run carries a block");
        assert!(block.chars() <= als::MAX_BLOCK_CHARS);
        assert!(request.system_text.starts_with("Antworte knapp."));
        assert!(request.system_text.ends_with(als::ALS_SYSTEM_INSTRUCTION));
        assert!(!request.user_prompt.contains(&block.text));
    }

    #[test]
    fn none_sentinel_omits_the_block_and_the_augmentation() {
        let request = build_request(
            &probe_identity(),
            &params(),
            "NONE",
            GroundingMode::Off,
            &config::RunConfig::default(),
        )
        .unwrap();

        assert!(request.als_block.is_none());
        assert_eq!(request.system_text, "Antworte knapp.");
    }

    #[test]
    fn unsupported_country_is_rejected() {
        let error = build_request(
            &probe_identity(),
            &params(),
            "BR",
            GroundingMode::Off,
            &config::RunConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(error, RuntimeError::Als(_)));
    }

    #[test]
    fn inference_params_flow_into_the_request() {
        let request = build_request(
            &probe_identity(),
            &params(),
            "CH",
            GroundingMode::Off,
            &config::RunConfig::default(),
        )
        .unwrap();

        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.top_p, Some(0.9));
        assert_eq!(request.seed, Some(7));
        assert_eq!(request.response_schema, Some(json!({"type": "object"})));
    }

    #[test]
    fn probe_detection_reads_name_or_prompt() {
        assert!(is_locale_probe("CH locale probe", "anything"));
        assert!(is_locale_probe("experiment 12", "Return VAT and plug types as JSON"));
        assert!(!is_locale_probe("brand perception", "Tell me about {{brand}}"));
    }
}
