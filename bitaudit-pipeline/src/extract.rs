//! Decomposes a unit's narrative text into standalone atomic facts.

use bitaudit_llm::traits::LlmClient;
use std::sync::Arc;

/// Instruction given to the text-generation capability.
const EXTRACTION_SYSTEM_PROMPT: &str = r#"You will receive a text in different structures, it could be a short story, a fun fact, or a trivia question.
Your job is to extract the facts from the text and return a list of facts.
Each fact should:
- Be written as a standalone fact including all the necessary information
- Use full names instead of just surnames
- Include relevant dates, locations, and context
- Be clear and complete without requiring knowledge from other facts

For example:
Bad: "Heydrich was assassinated in 1942 in Prague"
Good: "Reinhard Heydrich, a high-ranking Nazi official, was assassinated in 1942 in the neighborhood of Hradcany, Prague"

Bad: "The assassination marked a significant act of resistance"
Good: "The assassination of Reinhard Heydrich marked one of the most significant acts of resistance against the Nazi regime during World War II"

Return the facts as a numbered list."#;

const EXTRACTION_MAX_TOKENS: u32 = 1000;
const EXTRACTION_TEMPERATURE: f32 = 0.7;

/// Turns free text into an ordered list of self-contained statements.
pub struct FactExtractor {
    llm: Arc<dyn LlmClient + Send + Sync>,
}

impl FactExtractor {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self { llm }
    }

    /// Extract facts from one unit's text.
    ///
    /// Extraction failure for one unit must not abort the batch: any
    /// backend error is logged and yields an empty list.
    pub async fn extract(&self, text: &str) -> Vec<String> {
        let response = self
            .llm
            .generate(
                text,
                Some(EXTRACTION_SYSTEM_PROMPT),
                Some(EXTRACTION_MAX_TOKENS),
                Some(EXTRACTION_TEMPERATURE),
            )
            .await;

        match response {
            Ok(resp) => {
                let facts = parse_numbered_facts(&resp.text);
                tracing::debug!(facts = facts.len(), "extracted facts");
                facts
            }
            Err(e) => {
                tracing::warn!(error = %e, "fact extraction failed, returning no facts");
                Vec::new()
            }
        }
    }
}

/// Parse the model's numbered list into bare facts.
///
/// A line counts as a list item when it contains at least one digit; the
/// fact is whatever follows the first period. Lines without a period are
/// kept whole.
pub fn parse_numbered_facts(response: &str) -> Vec<String> {
    let mut facts = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() || !line.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }

        let fact = match line.split_once('.') {
            Some((_, rest)) => rest.trim(),
            None => line,
        };
        if !fact.is_empty() {
            facts.push(fact.to_string());
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bitaudit_common::{AuditError, Result};
    use bitaudit_llm::traits::LlmResponse;

    struct CannedClient {
        reply: Result<&'static str>,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.to_string(),
                    model: Some("canned".to_string()),
                    tokens_used: None,
                }),
                Err(e) => Err(AuditError::Llm(e.to_string())),
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn parses_a_plain_numbered_list() {
        let response = "1. The Eiffel Tower was completed in 1889.\n2. Gustave Eiffel designed it.";
        assert_eq!(
            parse_numbered_facts(response),
            vec![
                "The Eiffel Tower was completed in 1889.",
                "Gustave Eiffel designed it."
            ]
        );
    }

    #[test]
    fn drops_preamble_and_digitless_lines() {
        let response = "Here are the facts:\n\n1. Paris is in France.\nThat is all.";
        assert_eq!(parse_numbered_facts(response), vec!["Paris is in France."]);
    }

    #[test]
    fn keeps_digit_lines_without_a_period_whole() {
        assert_eq!(
            parse_numbered_facts("2) no period here"),
            vec!["2) no period here"]
        );
    }

    #[test]
    fn drops_empty_items_and_empty_input() {
        assert!(parse_numbered_facts("").is_empty());
        assert!(parse_numbered_facts("3.   ").is_empty());
    }

    #[test]
    fn preserves_extraction_order() {
        let response = "1. b.\n2. a.\n3. c.";
        assert_eq!(parse_numbered_facts(response), vec!["b.", "a.", "c."]);
    }

    #[tokio::test]
    async fn backend_failure_yields_empty_list() {
        let extractor = FactExtractor::new(std::sync::Arc::new(CannedClient {
            reply: Err(AuditError::Llm("boom".to_string())),
        }));
        assert!(extractor.extract("some text").await.is_empty());
        assert!(extractor.extract("").await.is_empty());
    }

    #[tokio::test]
    async fn facts_come_back_in_response_order() {
        let extractor = FactExtractor::new(std::sync::Arc::new(CannedClient {
            reply: Ok("1. First fact.\n2. Second fact."),
        }));
        assert_eq!(
            extractor.extract("unit text").await,
            vec!["First fact.", "Second fact."]
        );
    }
}
