//! Runs extraction and verification over every unit and collects rows.

use crate::extract::FactExtractor;
use crate::flatten::ProcessableUnit;
use crate::verify::{FactVerifier, Verdict};
use bitaudit_common::VerifyBackend;
use serde::{Deserialize, Serialize};

/// One fact's audit result, tagged with its unit's provenance.
///
/// Rows are created here, written once to the final report, and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub source_id: String,
    pub bit_id: String,
    pub bit_type: String,
    pub bit_text: String,
    pub fact: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Run the extract/verify loop over every unit, in order.
///
/// Pure composition: one row per extracted fact regardless of outcome, a
/// unit with zero facts contributes zero rows, and a failure on one fact
/// never prevents processing of subsequent facts or units.
pub async fn aggregate(
    units: &[ProcessableUnit],
    extractor: &FactExtractor,
    verifier: &FactVerifier,
    backend: VerifyBackend,
) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for (idx, unit) in units.iter().enumerate() {
        let facts = extractor.extract(&unit.text).await;
        tracing::info!(
            unit = idx + 1,
            total = units.len(),
            source_id = %unit.source_id,
            bit_id = %unit.bit_id,
            bit_type = %unit.bit_type,
            facts = facts.len(),
            "processing unit"
        );

        let mut incorrect = 0usize;
        for fact in facts {
            let outcome = verifier.verify(&fact, backend).await;
            match &outcome.verdict {
                Verdict::True => {}
                Verdict::False { explanation } => {
                    incorrect += 1;
                    tracing::info!(fact = %outcome.fact, explanation = %explanation, "incorrect fact");
                }
                Verdict::Error { message } => {
                    tracing::warn!(fact = %outcome.fact, message = %message, "verification error");
                }
            }

            rows.push(ReportRow {
                source_id: unit.source_id.clone(),
                bit_id: unit.bit_id.clone(),
                bit_type: unit.bit_type.clone(),
                bit_text: unit.text.clone(),
                fact: outcome.fact,
                verdict: outcome.verdict,
            });
        }

        if incorrect == 0 {
            tracing::info!(unit = idx + 1, "all extracted facts verified as correct");
        }
    }

    rows
}
