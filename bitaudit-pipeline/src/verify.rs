//! Checks atomic facts against one of two verification capabilities.
//!
//! The two backends have intentionally different failure behavior: the
//! primary backend fails closed (anything it cannot read counts as false),
//! while the grounded backend records unreadable responses as distinct
//! errors, never coerced into a truth value.

use bitaudit_common::VerifyBackend;
use bitaudit_llm::traits::LlmClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const FACT_CHECK_SYSTEM_PROMPT: &str = r#"You are a careful fact checker. You will receive a single standalone statement.
Decide whether the statement is factually accurate.
If it is accurate, respond with the single word "True".
If it is not, respond with "False" followed by a brief explanation of what is wrong.
Do not add any other commentary."#;

const GROUNDED_SYSTEM_PROMPT: &str = r#"You are an expert in web-based fact-checking, capable of verifying the accuracy of location-specific information.
Each story you receive will include a location, specified by country and city names. Your task is to:
Identify and verify key facts related to the location in each story,
noting any discrepancies or affirming complete accuracy.
Assign a correctness score from 1 to 5:
5 = All facts are accurate and relevant to the location.
1 = All facts are incorrect or irrelevant.
Additionally, provide a brief explanation covering only the most important incorrect data; do not explain what is correct.
Format your response exactly like this: Score: X, Explanation: Your single sentence here."#;

const PRIMARY_TEMPERATURE: f32 = 0.2;

/// Location context sent with every grounded verification request.
#[derive(Debug, Clone)]
pub struct GroundedContext {
    pub country: String,
    pub city: String,
}

impl Default for GroundedContext {
    fn default() -> Self {
        Self {
            country: "united states".to_string(),
            city: "new york".to_string(),
        }
    }
}

/// Truth judgment for one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "is_true", rename_all = "lowercase")]
pub enum Verdict {
    True,
    False { explanation: String },
    /// The backend replied outside its contract; kept separate from the
    /// truth values.
    Error { message: String },
}

impl Verdict {
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Column-friendly label for tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False { .. } => "False",
            Self::Error { .. } => "Error",
        }
    }

    /// The explanation column: empty for true facts.
    pub fn explanation(&self) -> &str {
        match self {
            Self::True => "",
            Self::False { explanation } => explanation,
            Self::Error { message } => message,
        }
    }
}

/// One verified fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub fact: String,
    pub verdict: Verdict,
}

/// Dispatches facts to the backend the caller selects per call.
pub struct FactVerifier {
    primary: Arc<dyn LlmClient + Send + Sync>,
    grounded: Option<Arc<dyn LlmClient + Send + Sync>>,
    context: GroundedContext,
}

impl FactVerifier {
    pub fn new(primary: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            primary,
            grounded: None,
            context: GroundedContext::default(),
        }
    }

    pub fn with_grounded(mut self, grounded: Arc<dyn LlmClient + Send + Sync>) -> Self {
        self.grounded = Some(grounded);
        self
    }

    pub fn with_context(mut self, context: GroundedContext) -> Self {
        self.context = context;
        self
    }

    /// Verify a single fact against the selected backend.
    pub async fn verify(&self, fact: &str, backend: VerifyBackend) -> VerificationOutcome {
        let verdict = match backend {
            VerifyBackend::Primary => self.verify_primary(fact).await,
            VerifyBackend::Grounded => self.verify_grounded(fact).await,
        };
        VerificationOutcome {
            fact: fact.to_string(),
            verdict,
        }
    }

    async fn verify_primary(&self, fact: &str) -> Verdict {
        let response = self
            .primary
            .generate(
                fact,
                Some(FACT_CHECK_SYSTEM_PROMPT),
                None,
                Some(PRIMARY_TEMPERATURE),
            )
            .await;

        match response {
            Ok(resp) => primary_verdict(&resp.text),
            Err(e) => {
                tracing::warn!(error = %e, "primary verification failed");
                Verdict::False {
                    explanation: "Error during verification".to_string(),
                }
            }
        }
    }

    async fn verify_grounded(&self, fact: &str) -> Verdict {
        let client = match &self.grounded {
            Some(client) => client,
            None => {
                return Verdict::Error {
                    message: "grounded backend not configured".to_string(),
                }
            }
        };

        let prompt = format!(
            "country: {}, city: {}, {}",
            self.context.country, self.context.city, fact
        );

        match client
            .generate(&prompt, Some(GROUNDED_SYSTEM_PROMPT), None, None)
            .await
        {
            Ok(resp) => grounded_verdict(&resp.text),
            Err(e) => {
                tracing::warn!(error = %e, "grounded verification failed");
                Verdict::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Primary contract: the response begins with "true" or it is false.
///
/// The false branch strips every literal `False` token and keeps the rest
/// as the explanation. Note that any response not starting with "true" is
/// counted as false, including verbose affirmatives; this matches the
/// upstream producer's behavior.
pub fn primary_verdict(response: &str) -> Verdict {
    let trimmed = response.trim();
    if trimmed.to_ascii_lowercase().starts_with("true") {
        Verdict::True
    } else {
        Verdict::False {
            explanation: trimmed.replace("False", "").trim().to_string(),
        }
    }
}

/// Grounded contract: `Score: X, Explanation: ...`.
///
/// Only the first comma separates the two parts; explanations routinely
/// contain commas of their own. Anything that does not fit the shape is a
/// hard verification error for that fact.
pub fn grounded_verdict(response: &str) -> Verdict {
    let trimmed = response.trim();
    let (score_part, rest) = match trimmed.split_once(',') {
        Some((score, rest)) => (score, rest.trim()),
        None => (trimmed, ""),
    };

    let score = score_part
        .split_once(':')
        .map(|(_, v)| v.trim())
        .and_then(|v| v.parse::<u8>().ok());

    match score {
        Some(5) => Verdict::True,
        Some(1..=4) => {
            let explanation = rest
                .strip_prefix("Explanation:")
                .map(str::trim)
                .unwrap_or(rest)
                .to_string();
            Verdict::False { explanation }
        }
        Some(other) => Verdict::Error {
            message: format!("score out of range: {other}"),
        },
        None => Verdict::Error {
            message: format!("unparseable verification response: {trimmed}"),
        },
    }
}
