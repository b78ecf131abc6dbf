//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML file (or inline snippet), then
//! `BITAUDIT_`-prefixed environment variables (`__` separates nesting
//! levels). After merging, `${VAR}` placeholders are expanded recursively
//! before the typed structs are materialised.
use bitaudit_common::{AuditError, ReportFormat, VerifyBackend};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Top-level configuration for an audit run.
#[derive(Debug, Deserialize)]
pub struct AuditConfig {
    pub version: Option<String>,
    pub llm: LlmSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub location: LocationContext,
}

/// Providers for the two capabilities the pipeline consumes.
///
/// `primary` serves both fact extraction and the primary verifier;
/// `grounded` is only required when the grounded backend is selected.
#[derive(Debug, Deserialize)]
pub struct LlmSettings {
    pub primary: ProviderConfig,
    #[serde(default)]
    pub grounded: Option<ProviderConfig>,
}

/// The tag is `provider`; each variant carries its own endpoint default.
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    Openai {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
    },
    Sonar {
        model: String,
        auth_token: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default = "default_sonar_endpoint")]
        endpoint: String,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Openai { model, .. } | Self::Sonar { model, .. } => model,
        }
    }

    pub fn auth_token(&self) -> &str {
        match self {
            Self::Openai { auth_token, .. } | Self::Sonar { auth_token, .. } => auth_token,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::Openai { endpoint, .. } | Self::Sonar { endpoint, .. } => endpoint,
        }
    }
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/".into()
}
fn default_sonar_endpoint() -> String {
    "https://api.perplexity.ai/".into()
}

/// Tuning knobs consumed by the flattener and aggregator.
#[derive(Debug, Deserialize)]
pub struct PipelineSettings {
    /// Hard cap on emitted units across the whole document.
    #[serde(default)]
    pub max_units: Option<usize>,
    /// Case-sensitive bit-type filter; `None` processes every type.
    #[serde(default)]
    pub bit_type: Option<String>,
    /// Which verification capability checks each fact.
    #[serde(default = "default_backend")]
    pub backend: VerifyBackend,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_units: None,
            bit_type: None,
            backend: default_backend(),
        }
    }
}

fn default_backend() -> VerifyBackend {
    VerifyBackend::Primary
}

#[derive(Debug, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_report_format")]
    pub format: ReportFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            format: default_report_format(),
        }
    }
}

fn default_report_format() -> ReportFormat {
    ReportFormat::Json
}

/// Location context sent with every grounded verification request.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationContext {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_city")]
    pub city: String,
}

impl Default for LocationContext {
    fn default() -> Self {
        Self {
            country: default_country(),
            city: default_city(),
        }
    }
}

fn default_country() -> String {
    "united states".into()
}
fn default_city() -> String {
    "new york".into()
}

impl AuditConfig {
    /// Reject configurations that would fail mid-batch.
    ///
    /// Credential problems must surface before the first unit is processed,
    /// so unresolved `${VAR}` placeholders and empty tokens are fatal here.
    pub fn validate(&self) -> Result<(), AuditError> {
        check_token("llm.primary", self.llm.primary.auth_token())?;
        if let Some(grounded) = &self.llm.grounded {
            check_token("llm.grounded", grounded.auth_token())?;
        } else if self.pipeline.backend == VerifyBackend::Grounded {
            return Err(AuditError::Config(
                "pipeline.backend is 'grounded' but llm.grounded is not configured".into(),
            ));
        }
        Ok(())
    }
}

fn check_token(which: &str, token: &str) -> Result<(), AuditError> {
    if token.trim().is_empty() {
        return Err(AuditError::Config(format!(
            "{which}.auth_token is empty"
        )));
    }
    if token.contains("${") {
        return Err(AuditError::Config(format!(
            "{which}.auth_token references an unset environment variable: {token}"
        )));
    }
    Ok(())
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct AuditConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for AuditConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditConfigLoader {
    /// Start with sensible defaults: YAML file + `BITAUDIT_` env overrides.
    ///
    /// ```
    /// use bitaudit_config::AuditConfigLoader;
    ///
    /// let config = AuditConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// llm:
    ///   primary:
    ///     provider: openai
    ///     model: "gpt-4o"
    ///     auth_token: "sk-demo"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.pipeline.max_units.is_none());
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("BITAUDIT").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use bitaudit_config::{AuditConfigLoader, ProviderConfig};
    ///
    /// let config = AuditConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   primary:
    ///     provider: openai
    ///     model: "gpt-4o"
    ///     auth_token: "sk-demo"
    ///   grounded:
    ///     provider: sonar
    ///     model: "sonar-pro"
    ///     auth_token: "pplx-demo"
    /// pipeline:
    ///   max_units: 100
    ///   bit_type: "Story"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.pipeline.max_units, Some(100));
    /// assert_eq!(config.pipeline.bit_type.as_deref(), Some("Story"));
    ///
    /// match &config.llm.primary {
    ///     ProviderConfig::Openai { model, endpoint, .. } => {
    ///         assert_eq!(model, "gpt-4o");
    ///         assert_eq!(endpoint, "https://api.openai.com/v1/");
    ///     }
    ///     _ => panic!("expected OpenAI configuration"),
    /// }
    /// ```
    pub fn load(self) -> Result<AuditConfig, ConfigError> {
        let cfg = self.builder.build()?;

        // Convert to serde_json::Value first so `${VAR}` expansion can walk
        // the whole tree regardless of where strings are nested.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: AuditConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
