//! Provider adapters and the run orchestrator.
//!
//! Every provider is wrapped in an adapter exposing one uniform contract:
//! take a [`RunRequest`], call the model, return a [`RunResult`] with the
//! grounding evidence the provider reported. Grounding is fail-closed: a
//! REQUIRED run that produced no grounding evidence is an error, never a
//! silently degraded result.

pub mod adapter;
mod error;
mod orchestrator;
mod request;
mod result;
mod sanitize;

pub use error::{ErrorKind, LlmError, LlmResult as Result};
pub use orchestrator::{AdapterHealth, Orchestrator};
pub use request::{GroundingMode, ProviderKind, RunRequest};
pub use result::{Citation, RunResult, Usage, parse_json_lenient};
pub use sanitize::sanitize_for_log;

pub use adapter::{ProviderAdapter, VersionProbe};
