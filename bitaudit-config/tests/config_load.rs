use bitaudit_common::VerifyBackend;
use bitaudit_config::{AuditConfigLoader, ProviderConfig};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "0.1"
llm:
  primary:
    provider: openai
    model: "gpt-4o"
    auth_token: "${OPENAI_API_KEY}"
    temperature: 0.2
    max_tokens: 1000
  grounded:
    provider: sonar
    model: "sonar-pro"
    auth_token: "${PERPLEXITY_API_KEY}"
pipeline:
  max_units: 100
  bit_type: "Story"
  backend: primary
report:
  format: csv
"#;
    let p = write_yaml(&tmp, "bitaudit.yaml", file_yaml);

    let config = AuditConfigLoader::new()
        .with_file(p)
        .load()
        .expect("load audit config");

    assert_eq!(config.version.as_deref(), Some("0.1"));
    assert_eq!(config.pipeline.max_units, Some(100));
    assert_eq!(config.pipeline.backend, VerifyBackend::Primary);
    assert!(matches!(config.llm.grounded, Some(ProviderConfig::Sonar { .. })));
}

#[test]
#[serial]
fn test_env_interpolation_fills_tokens() {
    temp_env::with_var("BITAUDIT_TEST_TOKEN", Some("sk-from-env"), || {
        let config = AuditConfigLoader::new()
            .with_yaml_str(
                r#"
llm:
  primary:
    provider: openai
    model: "gpt-4o"
    auth_token: "${BITAUDIT_TEST_TOKEN}"
"#,
            )
            .load()
            .expect("load audit config");

        assert_eq!(config.llm.primary.auth_token(), "sk-from-env");
        assert!(config.validate().is_ok());
    });
}

#[test]
#[serial]
fn test_default_location_context() {
    let config = AuditConfigLoader::new()
        .with_yaml_str(
            r#"
llm:
  primary:
    provider: openai
    model: "gpt-4o"
    auth_token: "sk-demo"
"#,
        )
        .load()
        .expect("load audit config");

    assert_eq!(config.location.country, "united states");
    assert_eq!(config.location.city, "new york");
}
