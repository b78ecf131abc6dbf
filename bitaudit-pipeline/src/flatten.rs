//! Flattens the nested hit/bit hierarchy into processable units.
//!
//! Field names are fixed by the upstream data producer and matched
//! exactly; the only tolerated variation is the outermost shape, which is
//! either the search-engine envelope (`hits.hits`) or a bare array of
//! hits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("document does not match the expected hit/bit shape: {0}")]
    Shape(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentShape {
    Envelope { hits: HitsEnvelope },
    Bare(Vec<Hit>),
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

/// One source entity as produced upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: HitSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitSource {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bit_data: Vec<BitRecord>,
}

/// One narrative/trivia unit inside a hit.
#[derive(Debug, Clone, Deserialize)]
pub struct BitRecord {
    #[serde(default)]
    pub bit_id: String,
    #[serde(default)]
    pub bit_type: String,
    #[serde(default)]
    pub bit_txt: String,
    /// 1-based answer-key index; the generator emits it as a string or a
    /// number depending on its mood.
    #[serde(rename = "rightAnswer", default)]
    pub right_answer: Option<AnswerIndex>,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerIndex {
    Number(i64),
    Text(String),
}

impl AnswerIndex {
    /// Non-numeric strings count as absent (fail open, not fatal).
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The flattened unit of work for extraction and verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessableUnit {
    pub source_id: String,
    pub bit_id: String,
    pub bit_type: String,
    pub text: String,
}

/// Caller-supplied flattening filters.
#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Hard cap on emitted units across the whole document.
    pub max_units: Option<usize>,
    /// Case-sensitive bit-type filter; filtered-out bits do not count
    /// toward `max_units`.
    pub bit_type: Option<String>,
}

/// Walk every hit in document order and emit one unit per usable bit.
///
/// A bit is usable when it passes the type filter and its resolved text is
/// non-empty. Hits that yield zero units are silently absent from the
/// output.
pub fn flatten(doc: &Value, opts: &FlattenOptions) -> Result<Vec<ProcessableUnit>, FlattenError> {
    let shape: DocumentShape =
        serde_json::from_value(doc.clone()).map_err(|e| FlattenError::Shape(e.to_string()))?;
    let hits = match shape {
        DocumentShape::Envelope { hits } => hits.hits,
        DocumentShape::Bare(hits) => hits,
    };

    let mut units = Vec::new();
    'hits: for hit in hits {
        for bit in hit.source.bit_data {
            if let Some(cap) = opts.max_units {
                if units.len() >= cap {
                    break 'hits;
                }
            }
            if let Some(filter) = &opts.bit_type {
                if bit.bit_type != *filter {
                    continue;
                }
            }

            let text = resolve_text(&bit);
            if text.is_empty() {
                continue;
            }

            units.push(ProcessableUnit {
                source_id: hit.id.clone(),
                bit_id: bit.bit_id,
                bit_type: bit.bit_type,
                text,
            });
        }
    }

    tracing::debug!(units = units.len(), "flattened document");
    Ok(units)
}

/// Trivia bits get the answer-key option spelled out; everything else
/// passes through unchanged.
fn resolve_text(bit: &BitRecord) -> String {
    if !bit.bit_type.eq_ignore_ascii_case("trivia") {
        return bit.bit_txt.clone();
    }

    let index = match bit.right_answer.as_ref().and_then(AnswerIndex::as_i64) {
        Some(i) => i,
        None => return bit.bit_txt.clone(),
    };
    if index <= 0 || index as usize > bit.answers.len() {
        return bit.bit_txt.clone();
    }

    let answer = &bit.answers[index as usize - 1];
    format!("{} The right answer is: {}", bit.bit_txt, answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trivia_doc() -> Value {
        json!({
            "hits": {
                "hits": [
                    {
                        "_id": "p1",
                        "_source": {
                            "bit_data": [
                                {
                                    "bit_id": "b1",
                                    "bit_type": "Trivia",
                                    "bit_txt": "Capital of France?",
                                    "rightAnswer": "1",
                                    "answers": ["Paris", "Lyon"]
                                }
                            ]
                        }
                    }
                ]
            }
        })
    }

    #[test]
    fn resolves_answer_key_into_text() {
        let units = flatten(&trivia_doc(), &FlattenOptions::default()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_id, "p1");
        assert_eq!(units[0].bit_id, "b1");
        assert_eq!(
            units[0].text,
            "Capital of France? The right answer is: Paris"
        );
    }

    #[test]
    fn out_of_range_answer_index_leaves_text_unchanged() {
        for idx in [json!(0), json!(5), json!("0"), json!("not a number")] {
            let doc = json!([{
                "_id": "p1",
                "_source": {
                    "bit_data": [{
                        "bit_id": "b1",
                        "bit_type": "Trivia",
                        "bit_txt": "Capital of France?",
                        "rightAnswer": idx.clone(),
                        "answers": ["A", "B", "C"]
                    }]
                }
            }]);
            let units = flatten(&doc, &FlattenOptions::default()).unwrap();
            assert_eq!(units[0].text, "Capital of France?", "index {idx}");
        }
    }

    #[test]
    fn numeric_answer_index_is_accepted() {
        let doc = json!([{
            "_id": "p1",
            "_source": {
                "bit_data": [{
                    "bit_id": "b1",
                    "bit_type": "Trivia",
                    "bit_txt": "Pick one.",
                    "rightAnswer": 2,
                    "answers": ["A", "B", "C"]
                }]
            }
        }]);
        let units = flatten(&doc, &FlattenOptions::default()).unwrap();
        assert_eq!(units[0].text, "Pick one. The right answer is: B");
    }

    #[test]
    fn non_trivia_bits_are_never_enriched() {
        let doc = json!([{
            "_id": "p1",
            "_source": {
                "bit_data": [{
                    "bit_id": "b1",
                    "bit_type": "Story",
                    "bit_txt": "A tale.",
                    "rightAnswer": 1,
                    "answers": ["A"]
                }]
            }
        }]);
        let units = flatten(&doc, &FlattenOptions::default()).unwrap();
        assert_eq!(units[0].text, "A tale.");
    }

    fn many_bits_doc() -> Value {
        let bits: Vec<Value> = (0..10)
            .map(|i| {
                json!({
                    "bit_id": format!("b{i}"),
                    "bit_type": if i % 2 == 0 { "Story" } else { "Trivia" },
                    "bit_txt": format!("text {i}")
                })
            })
            .collect();
        json!([{ "_id": "p1", "_source": { "bit_data": bits } }])
    }

    #[test]
    fn cap_is_a_monotonic_prefix_of_the_unbounded_flatten() {
        let unbounded = flatten(&many_bits_doc(), &FlattenOptions::default()).unwrap();
        for k in 0..=unbounded.len() {
            let opts = FlattenOptions {
                max_units: Some(k),
                ..Default::default()
            };
            let capped = flatten(&many_bits_doc(), &opts).unwrap();
            assert_eq!(capped.len(), k);
            assert_eq!(capped[..], unbounded[..k]);
        }
    }

    #[test]
    fn cap_spans_hits_not_per_hit() {
        let doc = json!([
            { "_id": "p1", "_source": { "bit_data": [
                {"bit_id": "a", "bit_type": "Story", "bit_txt": "one"},
                {"bit_id": "b", "bit_type": "Story", "bit_txt": "two"}
            ]}},
            { "_id": "p2", "_source": { "bit_data": [
                {"bit_id": "c", "bit_type": "Story", "bit_txt": "three"}
            ]}}
        ]);
        let opts = FlattenOptions {
            max_units: Some(2),
            ..Default::default()
        };
        let units = flatten(&doc, &opts).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].bit_id, "b");
    }

    #[test]
    fn type_filter_is_case_sensitive_and_does_not_consume_the_cap() {
        let opts = FlattenOptions {
            max_units: Some(3),
            bit_type: Some("Trivia".to_string()),
        };
        let units = flatten(&many_bits_doc(), &opts).unwrap();
        // Bits 1, 3, 5 are Trivia; the interleaved Story bits are skipped
        // without counting toward the cap.
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.bit_type == "Trivia"));

        let lowercase = FlattenOptions {
            max_units: None,
            bit_type: Some("trivia".to_string()),
        };
        assert!(flatten(&many_bits_doc(), &lowercase).unwrap().is_empty());
    }

    #[test]
    fn empty_text_bits_and_empty_hits_are_dropped() {
        let doc = json!([
            { "_id": "p1", "_source": { "bit_data": [
                {"bit_id": "a", "bit_type": "Story", "bit_txt": ""}
            ]}},
            { "_id": "p2", "_source": { "bit_data": [] }},
            { "_id": "p3", "_source": { "bit_data": [
                {"bit_id": "b", "bit_type": "Story", "bit_txt": "kept"}
            ]}}
        ]);
        let units = flatten(&doc, &FlattenOptions::default()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_id, "p3");
    }

    #[test]
    fn rejects_documents_without_the_expected_shape() {
        let doc = json!({"rows": []});
        assert!(flatten(&doc, &FlattenOptions::default()).is_err());
    }
}
