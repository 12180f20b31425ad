//! Brandlens configuration structures to map the brandlens.toml file.

#![deny(missing_docs)]

mod database;
mod llm;
mod loader;
mod redis;
mod run;
mod server;

use std::path::Path;

pub use database::DatabaseConfig;
pub use llm::{LlmConfig, OpenAiConfig, VertexConfig};
pub use redis::RedisConfig;
pub use run::RunConfig;
use serde::Deserialize;
pub use server::ServerConfig;

/// Main configuration structure for the Brandlens application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Postgres settings for templates, versions and results.
    pub database: DatabaseConfig,
    /// Redis settings for the version-probe idempotency guard.
    pub redis: RedisConfig,
    /// Provider adapter settings.
    pub llm: LlmConfig,
    /// Run execution settings (deadlines, parallelism).
    pub run: RunConfig,
}

impl Config {
    /// Load configuration from a TOML file and overlay identity
    /// environment variables.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validate that at least one provider adapter is usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate_has_providers(self)
    }
}
