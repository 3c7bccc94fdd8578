//! Cross-provider consensus extraction.
//!
//! Every healthy provider answers the same general extraction prompt; the
//! outputs are flattened to string fields, normalized, and merged by
//! plurality vote. Ties break to the earliest provider in registration
//! order, so reruns over the same outputs always merge identically.

use crate::context::ProcessingContext;
use crate::extraction::structured_object;
use crate::heuristics::normalize_for_match;
use crate::prompts;
use marquee_core::{
    ConsensusOptions, ConsensusResult, FieldConsensus, ImageRef, ProviderOutput,
};
use marquee_error::{ConsensusError, ConsensusErrorKind, MarqueeResult};
use marquee_interface::VisionExtractionProvider;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Keys that carry model self-assessment rather than poster content.
const NON_CONTENT_FIELDS: [&str; 2] = ["confidence", "evidence"];

/// Runs the consensus fan-out and merge.
#[derive(Debug, Clone)]
pub struct ConsensusProcessor {
    options: ConsensusOptions,
}

impl ConsensusProcessor {
    /// Create a processor with the given options.
    ///
    /// # Errors
    ///
    /// Rejects an agreement ratio outside [0, 1].
    pub fn new(options: ConsensusOptions) -> MarqueeResult<Self> {
        if !(0.0..=1.0).contains(&options.min_agreement_ratio) {
            return Err(ConsensusError::new(ConsensusErrorKind::InvalidAgreementRatio(
                options.min_agreement_ratio.to_string(),
            ))
            .into());
        }
        Ok(Self { options })
    }

    /// The options this processor runs with.
    pub fn options(&self) -> &ConsensusOptions {
        &self.options
    }

    /// Fan the extraction prompt out to every provider and merge the
    /// responses field by field.
    ///
    /// Total failure is reported in the result, never returned as an error;
    /// the caller decides whether to fall back to single-provider phases.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id(), providers = providers.len()))]
    pub async fn run(
        &self,
        image: &ImageRef,
        providers: &[Arc<dyn VisionExtractionProvider>],
        ctx: &mut ProcessingContext,
    ) -> ConsensusResult {
        let prompt = prompts::consensus_prompt();

        if providers.is_empty() {
            let failure = ConsensusErrorKind::EmptyProviderList.to_string();
            ctx.record_error(format!("consensus: {failure}"));
            return ConsensusResult {
                failure: Some(failure),
                degraded: true,
                ..ConsensusResult::default()
            };
        }

        let raw_outputs = if self.options.parallel {
            let calls = providers
                .iter()
                .map(|provider| self.call_one(image, &prompt, Arc::clone(provider)));
            futures::future::join_all(calls).await
        } else {
            let mut outputs = Vec::with_capacity(providers.len());
            for provider in providers {
                outputs
                    .push(self.call_one(image, &prompt, Arc::clone(provider)).await);
            }
            outputs
        };

        let provider_names: Vec<String> =
            raw_outputs.iter().map(|o| o.provider.clone()).collect();

        let mut result = merge_outputs(&raw_outputs, self.options.min_agreement_ratio);
        result.providers = provider_names;
        result.raw_outputs = raw_outputs;

        for output in &result.raw_outputs {
            if let Some(error) = &output.error {
                ctx.record_error(format!("consensus: {}: {error}", output.provider));
            }
        }

        // Seed the context so phase parses can fall back to merged values
        for (field, consensus) in &result.merged_fields {
            ctx.record_field(
                field.clone(),
                consensus.value.clone(),
                consensus.agreement,
                "consensus",
            );
        }

        tracing::info!(
            agreement = result.agreement_score,
            fields = result.merged_fields.len(),
            degraded = result.degraded,
            "Consensus finished"
        );
        result
    }

    async fn call_one(
        &self,
        image: &ImageRef,
        prompt: &str,
        provider: Arc<dyn VisionExtractionProvider>,
    ) -> ProviderOutput {
        let name = provider.model_name().to_string();
        let deadline = Duration::from_millis(self.options.model_timeout_ms);
        match tokio::time::timeout(deadline, provider.extract_from_image(image, prompt)).await
        {
            Ok(Ok(response)) => ProviderOutput {
                provider: name,
                response: Some(response),
                error: None,
            },
            Ok(Err(e)) => {
                tracing::warn!(provider = %name, error = %e, "Consensus provider failed");
                ProviderOutput {
                    provider: name,
                    response: None,
                    error: Some(e.to_string()),
                }
            }
            Err(_) => {
                tracing::warn!(provider = %name, timeout_ms = self.options.model_timeout_ms, "Consensus provider timed out");
                ProviderOutput {
                    provider: name,
                    response: None,
                    error: Some(format!(
                        "timed out after {}ms",
                        self.options.model_timeout_ms
                    )),
                }
            }
        }
    }
}

/// Flatten one provider response into comparable string fields.
fn flatten_fields(output: &ProviderOutput) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let Some(response) = &output.response else {
        return fields;
    };
    let Some(map) = structured_object(response) else {
        return fields;
    };
    for (key, value) in &map {
        if NON_CONTENT_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let Some(flat) = flatten_value(value) else {
            continue;
        };
        if !flat.is_empty() {
            fields.insert(key.clone(), flat);
        }
    }
    fields
}

fn flatten_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(flatten_value)
                .filter(|s| !s.is_empty())
                .collect();
            Some(parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Merge provider outputs by plurality vote over normalized values.
///
/// For each field, the winning value is the most frequent after
/// normalization; ties break to the value contributed by the earliest
/// provider. A plurality that does not exceed the agreement ratio still
/// yields the first provider's value, with the honest (low) agreement
/// recorded.
fn merge_outputs(outputs: &[ProviderOutput], min_agreement_ratio: f32) -> ConsensusResult {
    let flattened: Vec<BTreeMap<String, String>> =
        outputs.iter().map(flatten_fields).collect();
    let responding = flattened.iter().filter(|f| !f.is_empty()).count();

    if responding == 0 {
        return ConsensusResult {
            failure: Some(ConsensusErrorKind::AllProvidersFailed(outputs.len()).to_string()),
            degraded: true,
            ..ConsensusResult::default()
        };
    }

    let mut merged_fields = BTreeMap::new();
    let mut field_names: Vec<&String> = Vec::new();
    for fields in &flattened {
        for name in fields.keys() {
            if !field_names.contains(&name) {
                field_names.push(name);
            }
        }
    }

    for name in field_names {
        // Insertion-ordered grouping keeps the tie-break deterministic:
        // first group wins among equal counts.
        let mut groups: Vec<(String, String, usize)> = Vec::new();
        let mut responders = 0;
        for fields in &flattened {
            let Some(value) = fields.get(name) else {
                continue;
            };
            responders += 1;
            let normalized = normalize_for_match(value);
            match groups.iter_mut().find(|(n, _, _)| *n == normalized) {
                Some((_, _, count)) => *count += 1,
                None => groups.push((normalized, value.clone(), 1)),
            }
        }
        let Some(max_count) = groups.iter().map(|(_, _, c)| *c).max() else {
            continue;
        };
        // First group with the winning count, so equal counts resolve to the
        // earliest provider.
        let Some((_, winner, count)) = groups
            .iter()
            .find(|(_, _, c)| *c == max_count)
            .map(|(n, v, c)| (n.clone(), v.clone(), *c))
        else {
            continue;
        };

        let agreement = count as f32 / responders as f32;
        let unanimous = count == responders;
        let accepted = if unanimous || agreement > min_agreement_ratio {
            winner
        } else {
            // At or below the ratio no plurality is trusted; take the
            // first provider's answer so the choice stays deterministic.
            groups[0].1.clone()
        };
        merged_fields.insert(
            name.clone(),
            FieldConsensus {
                value: accepted,
                agreement,
                responders,
                unanimous,
            },
        );
    }

    let degraded = responding < 2;
    let agreement_score = if degraded {
        1.0
    } else if merged_fields.is_empty() {
        0.0
    } else {
        merged_fields.values().map(|f| f.agreement).sum::<f32>() / merged_fields.len() as f32
    };

    ConsensusResult {
        providers: Vec::new(),
        agreement_score,
        merged_fields,
        raw_outputs: Vec::new(),
        degraded,
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::ExtractionResponse;

    fn output(provider: &str, json: serde_json::Value) -> ProviderOutput {
        ProviderOutput {
            provider: provider.to_string(),
            response: Some(ExtractionResponse {
                extracted_text: String::new(),
                structured_data: Some(json),
                confidence: None,
                usage: None,
            }),
            error: None,
        }
    }

    fn failed_output(provider: &str) -> ProviderOutput {
        ProviderOutput {
            provider: provider.to_string(),
            response: None,
            error: Some("boom".to_string()),
        }
    }

    #[test]
    fn plurality_wins_with_normalization() {
        let outputs = vec![
            output("a", serde_json::json!({"venue": "The Tivoli"})),
            output("b", serde_json::json!({"venue": "the  tivoli"})),
            output("c", serde_json::json!({"venue": "Fortitude Music Hall"})),
        ];
        let result = merge_outputs(&outputs, 0.5);
        let venue = &result.merged_fields["venue"];
        assert_eq!(venue.value, "The Tivoli");
        assert_eq!(venue.responders, 3);
        assert!(!venue.unanimous);
        assert!((venue.agreement - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn ties_break_to_first_provider() {
        let outputs = vec![
            output("a", serde_json::json!({"headliner": "Alpha"})),
            output("b", serde_json::json!({"headliner": "Beta"})),
        ];
        let result = merge_outputs(&outputs, 0.8);
        // 1-of-2 is below the 0.8 ratio; the first provider's value holds
        assert_eq!(result.merged_fields["headliner"].value, "Alpha");
        assert_eq!(result.merged_fields["headliner"].agreement, 0.5);
    }

    #[test]
    fn plurality_at_the_exact_ratio_is_rejected() {
        let outputs = vec![
            output("a", serde_json::json!({"venue": "The Zoo"})),
            output("b", serde_json::json!({"venue": "The Tivoli"})),
            output("c", serde_json::json!({"venue": "The Tivoli"})),
            output("d", serde_json::json!({"venue": "The Triffid"})),
        ];
        // 2-of-4 agreement sits exactly on the 0.5 ratio; the plurality
        // must exceed the ratio, so the first provider's value holds.
        let result = merge_outputs(&outputs, 0.5);
        assert_eq!(result.merged_fields["venue"].value, "The Zoo");
        assert_eq!(result.merged_fields["venue"].agreement, 0.5);
    }

    #[test]
    fn merge_is_deterministic_across_reruns() {
        let outputs = vec![
            output("a", serde_json::json!({"city": "Brisbane", "venue": "X"})),
            output("b", serde_json::json!({"city": "brisbane", "venue": "Y"})),
            output("c", serde_json::json!({"city": "Sydney", "venue": "Z"})),
        ];
        let first = merge_outputs(&outputs, 0.5);
        for _ in 0..10 {
            assert_eq!(merge_outputs(&outputs, 0.5), first);
        }
    }

    #[test]
    fn single_responder_is_degraded() {
        let outputs = vec![
            output("a", serde_json::json!({"venue": "The Zoo"})),
            failed_output("b"),
        ];
        let result = merge_outputs(&outputs, 0.5);
        assert!(result.degraded);
        assert!(!result.failed());
        assert_eq!(result.agreement_score, 1.0);
        assert_eq!(result.field("venue"), Some("The Zoo"));
    }

    #[test]
    fn total_failure_is_reported_not_thrown() {
        let outputs = vec![failed_output("a"), failed_output("b")];
        let result = merge_outputs(&outputs, 0.5);
        assert!(result.failed());
        assert!(result.merged_fields.is_empty());
    }

    #[test]
    fn out_of_range_agreement_ratio_is_rejected() {
        let options = ConsensusOptions {
            min_agreement_ratio: 1.5,
            ..ConsensusOptions::default()
        };
        assert!(ConsensusProcessor::new(options).is_err());
        assert!(ConsensusProcessor::new(ConsensusOptions::default()).is_ok());
    }

    #[test]
    fn arrays_flatten_to_joined_lists() {
        let outputs = vec![
            output(
                "a",
                serde_json::json!({"supporting_acts": ["Big Thief", "Wednesday"]}),
            ),
            output(
                "b",
                serde_json::json!({"supporting_acts": ["Big Thief", "Wednesday"]}),
            ),
        ];
        let result = merge_outputs(&outputs, 0.5);
        let field = &result.merged_fields["supporting_acts"];
        assert_eq!(field.value, "Big Thief, Wednesday");
        assert!(field.unanimous);
    }
}
