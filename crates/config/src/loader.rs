//! Configuration loading and environment overlay.

use std::path::Path;

use anyhow::Context;
use secrecy::SecretString;

use crate::Config;

pub(crate) fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    overlay_env(&mut config);

    Ok(config)
}

/// Identity environment variables fill any gaps the file leaves. The file
/// wins for everything except `DATABASE_URL` and `GOOGLE_CLOUD_REGION`,
/// which follow deployment convention and override.
pub(crate) fn overlay_env(config: &mut Config) {
    if let Ok(url) = std::env::var("DATABASE_URL")
        && !url.is_empty()
    {
        config.database.url = Some(url);
    }

    if config.llm.openai.api_key.is_none()
        && let Ok(key) = std::env::var("OPENAI_API_KEY")
        && !key.is_empty()
    {
        config.llm.openai.api_key = Some(SecretString::from(key));
    }

    if config.llm.vertex.project.is_none()
        && let Ok(project) = std::env::var("GOOGLE_CLOUD_PROJECT")
        && !project.is_empty()
    {
        config.llm.vertex.project = Some(project);
    }

    if let Ok(region) = std::env::var("GOOGLE_CLOUD_REGION")
        && !region.is_empty()
    {
        config.llm.vertex.region = region;
    }

    if config.llm.vertex.impersonate_service_account.is_none()
        && let Ok(account) = std::env::var("GOOGLE_IMPERSONATE_SERVICE_ACCOUNT")
        && !account.is_empty()
    {
        config.llm.vertex.impersonate_service_account = Some(account);
    }
}

pub(crate) fn validate_has_providers(config: &Config) -> anyhow::Result<()> {
    if !config.llm.openai.enabled() && !config.llm.vertex.enabled() {
        anyhow::bail!(
            "no provider adapter is configured; set llm.openai.api_key (or OPENAI_API_KEY) \
             or llm.vertex.project (or GOOGLE_CLOUD_PROJECT)"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults_parse_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.redis.probe_guard_ttl_secs, 3600);
        assert_eq!(config.run.hard_deadline_secs, 120);
        assert_eq!(config.run.grounded_soft_deadline_secs, 60);
        assert_eq!(config.llm.vertex.region, "europe-west4");
        assert!(!config.llm.vertex.prefer_adc);
    }

    #[test]
    fn full_file_parses() {
        let config: Config = toml::from_str(indoc! {r#"
            [server]
            listen_address = "127.0.0.1:8012"

            [database]
            url = "postgres://localhost/brandlens"
            max_connections = 4

            [redis]
            url = "redis://127.0.0.1:6379"

            [llm.openai]
            api_key = "sk-test"

            [llm.vertex]
            project = "brandlens-dev"
            region = "global"
            prefer_adc = true

            [run]
            max_parallel = 8
        "#})
        .unwrap();

        assert!(config.llm.openai.enabled());
        assert!(config.llm.vertex.enabled());
        assert_eq!(config.llm.vertex.region, "global");
        assert_eq!(config.run.max_parallel, 8);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Config, _> = toml::from_str("[llm.openai]\nmodel = \"gpt-5\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn env_fills_missing_identity() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-env")),
                ("GOOGLE_CLOUD_PROJECT", Some("env-project")),
                ("GOOGLE_CLOUD_REGION", Some("europe-west1")),
                ("DATABASE_URL", None::<&str>),
                ("GOOGLE_IMPERSONATE_SERVICE_ACCOUNT", None::<&str>),
            ],
            || {
                let mut config = Config::default();
                overlay_env(&mut config);

                assert!(config.llm.openai.enabled());
                assert_eq!(config.llm.vertex.project.as_deref(), Some("env-project"));
                assert_eq!(config.llm.vertex.region, "europe-west1");
            },
        );
    }

    #[test]
    fn validation_requires_a_provider() {
        let config = Config::default();
        assert!(validate_has_providers(&config).is_err());
    }
}
