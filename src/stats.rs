/// Running aggregation over parsed records: request counters, per-model
/// latency means, and longest-prompt tracking. One `Aggregator` lives for
/// exactly one session (one CLI invocation of one mode).
use crate::record::ParsedRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Per-model row of a finished summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub model: String,
    pub requests: u64,
    /// Running mean over recorded latency samples; `None` when the model
    /// never carried a usable latency value.
    pub mean_latency: Option<f64>,
}

/// Longest prompt seen across a session, tracked incrementally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongestPrompt {
    pub text: String,
    pub chars: usize,
}

/// Read-only view produced by `Aggregator::summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub model_count: usize,
    /// Sorted by model name so report output is deterministic.
    pub models: Vec<ModelStats>,
    pub longest_prompt: Option<LongestPrompt>,
}

/// Accumulates parsed records into running statistics.
///
/// `update` counts — it does not deduplicate. Replaying the same physical
/// line twice double-counts; callers own that invariant.
#[derive(Debug, Default)]
pub struct Aggregator {
    total: u64,
    success: u64,
    failure: u64,
    per_model_count: HashMap<String, u64>,
    per_model_latency_sum: HashMap<String, f64>,
    per_model_latency_count: HashMap<String, u64>,
    longest_prompt: Option<LongestPrompt>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the running statistics.
    ///
    /// Any status other than `"success"`/`"failure"` increments neither
    /// outcome counter but still counts toward `total` and the per-model
    /// counts. That permissive policy is deliberate.
    pub fn update(&mut self, record: &ParsedRecord) {
        self.total += 1;

        match record.status.as_str() {
            "success" => self.success += 1,
            "failure" => self.failure += 1,
            _ => {}
        }

        *self
            .per_model_count
            .entry(record.model.clone())
            .or_insert(0) += 1;

        // The -1 sentinel means "no latency in the payload"; it is not a
        // sample and must not drag the mean below zero.
        if record.latency >= 0.0 {
            *self
                .per_model_latency_sum
                .entry(record.model.clone())
                .or_insert(0.0) += record.latency;
            *self
                .per_model_latency_count
                .entry(record.model.clone())
                .or_insert(0) += 1;
        }

        let chars = record.prompt.chars().count();
        let current_max = self.longest_prompt.as_ref().map_or(0, |p| p.chars);
        if chars > current_max {
            self.longest_prompt = Some(LongestPrompt {
                text: record.prompt.clone(),
                chars,
            });
        }
    }

    /// Number of records folded in so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Produce the summary view. Pure read; the aggregator is reusable after.
    pub fn summary(&self) -> Summary {
        let mut models: Vec<ModelStats> = self
            .per_model_count
            .iter()
            .map(|(model, &requests)| {
                let samples = self
                    .per_model_latency_count
                    .get(model)
                    .copied()
                    .unwrap_or(0);
                let mean_latency = if samples > 0 {
                    Some(self.per_model_latency_sum[model] / samples as f64)
                } else {
                    None
                };
                ModelStats {
                    model: model.clone(),
                    requests,
                    mean_latency,
                }
            })
            .collect();
        models.sort_by(|a, b| a.model.cmp(&b.model));

        Summary {
            total: self.total,
            success: self.success,
            failure: self.failure,
            model_count: self.per_model_count.len(),
            models,
            longest_prompt: self.longest_prompt.clone(),
        }
    }
}
