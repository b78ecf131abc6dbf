//! Provider-agnostic LLM integration for Bitaudit.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for OpenAI and Perplexity Sonar. It also provides
//! a convenience function to build a client from a
//! [`bitaudit_config::ProviderConfig`].
//!
//! # Examples
//! ```no_run
//! use bitaudit_config::ProviderConfig;
//! use bitaudit_llm::client_from_config;
//!
//! # fn main() -> bitaudit_common::Result<()> {
//! let cfg = ProviderConfig::Openai {
//!     model: "gpt-4o".into(),
//!     auth_token: "sk-demo".into(),
//!     temperature: None,
//!     max_tokens: None,
//!     endpoint: "https://api.openai.com/v1/".into(),
//! };
//! let client = client_from_config(&cfg)?;
//! assert_eq!(client.model_name(), "gpt-4o");
//! # Ok(())
//! # }
//! ```
pub mod openai;
pub mod sonar;
pub mod traits;

use bitaudit_config::ProviderConfig;
use openai::OpenAiClient;
use sonar::SonarClient;
use std::sync::Arc;
use traits::LlmClient;

/// Default model recommendations for audit tasks.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_SONAR_MODEL: &str = "sonar-pro";

/// Build a ready-to-use client from provider configuration.
pub fn client_from_config(
    config: &ProviderConfig,
) -> bitaudit_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        ProviderConfig::Openai {
            model,
            auth_token,
            temperature,
            max_tokens,
            endpoint,
        } => {
            let client = OpenAiClient::with_base_url(auth_token.clone(), model.clone(), endpoint)?
                .with_defaults(*max_tokens, *temperature);
            Ok(Arc::new(client))
        }
        ProviderConfig::Sonar {
            model,
            auth_token,
            temperature,
            endpoint,
        } => {
            let client = SonarClient::with_base_url(auth_token.clone(), model.clone(), endpoint)?
                .with_default_temperature(*temperature);
            Ok(Arc::new(client))
        }
    }
}
