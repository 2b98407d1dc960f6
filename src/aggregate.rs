//! # Weighted Aggregator
//!
//! Blends per-source sentiment summaries into a single bounded 0-100
//! reputation score using fixed per-source trust weights.
//!
//! - Sources that are unavailable, or available with zero classified
//!   mentions, contribute nothing: the score is renormalized over the
//!   weight that actually reported (absence is excluded, not treated as
//!   negative evidence).
//! - With no usable source at all the score degrades to a neutral `50`,
//!   flagged via `had_any_data = false` so callers can display it
//!   distinctly from a measured 50.
//! - Pure and deterministic; never fails.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::collect::types::{SourceKind, SourceResult};
use crate::summary::SentimentSummary;

/// A configured source with its trust weight in `(0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedSource {
    pub kind: SourceKind,
    pub weight: f32,
}

/// Per-source trust weights, loaded from JSON or the built-in seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWeightsConfig {
    pub sources: Vec<WeightedSource>,
}

impl SourceWeightsConfig {
    /// Load from a JSON file; falls back to `default_seed()` when the file
    /// is missing, unparseable, or carries invalid weights.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Self>(&s)
                .ok()
                .filter(Self::is_valid)
                .unwrap_or_else(Self::default_seed),
            Err(_) => Self::default_seed(),
        }
    }

    /// The fixed production set: 0.30 social-forum, 0.25 news,
    /// 0.20 microblog, 0.25 reviews.
    pub fn default_seed() -> Self {
        Self {
            sources: vec![
                WeightedSource {
                    kind: SourceKind::Social,
                    weight: 0.30,
                },
                WeightedSource {
                    kind: SourceKind::News,
                    weight: 0.25,
                },
                WeightedSource {
                    kind: SourceKind::Microblog,
                    weight: 0.20,
                },
                WeightedSource {
                    kind: SourceKind::Reviews,
                    weight: 0.25,
                },
            ],
        }
    }

    pub fn weight_for(&self, kind: SourceKind) -> Option<f32> {
        self.sources
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.weight)
    }

    fn is_valid(&self) -> bool {
        !self.sources.is_empty()
            && self
                .sources
                .iter()
                .all(|s| s.weight > 0.0 && s.weight <= 1.0)
    }
}

/// One breakdown row per configured source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceScore {
    pub kind: SourceKind,
    pub weight: f32,
    /// `positive / total * 100` for sources that reported data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SentimentSummary>,
    pub is_fallback: bool,
}

/// Aggregation result; `score` is always within `[0, 100]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateOutcome {
    pub score: i32,
    pub had_any_data: bool,
    pub breakdown: Vec<SourceScore>,
}

impl AggregateOutcome {
    /// Positive share over all reporting sources, used to seed the trend
    /// baseline. Falls back to `score / 100` when no counts exist.
    pub fn overall_positive_ratio(&self) -> f32 {
        let (pos, total) = self
            .breakdown
            .iter()
            .filter_map(|row| row.summary)
            .fold((0u32, 0u32), |(p, t), s| (p + s.positive, t + s.total));
        if total > 0 {
            pos as f32 / total as f32
        } else {
            self.score as f32 / 100.0
        }
    }
}

/// Neutral default used when no source reported any data.
pub const NEUTRAL_SCORE: i32 = 50;

/// Blend whatever arrived into one bounded score. `results` pairs each
/// configured source with the outcome of its collector; sources missing
/// from the slice count as unavailable.
pub fn aggregate(
    results: &[(SourceKind, &SourceResult)],
    weights: &SourceWeightsConfig,
) -> AggregateOutcome {
    let mut score_acc = 0.0f32;
    let mut weight_seen = 0.0f32;
    let mut breakdown = Vec::with_capacity(weights.sources.len());

    for ws in &weights.sources {
        let result = results
            .iter()
            .find(|(kind, _)| *kind == ws.kind)
            .map(|(_, r)| *r);

        let row = match result {
            Some(SourceResult::Available(data)) if !data.summary.is_empty() => {
                let source_score = data.summary.positive_ratio() * 100.0;
                score_acc += source_score * ws.weight;
                weight_seen += ws.weight;
                SourceScore {
                    kind: ws.kind,
                    weight: ws.weight,
                    score: Some(source_score),
                    summary: Some(data.summary),
                    is_fallback: data.is_fallback,
                }
            }
            // Present-but-empty is excluded from the blend, like unavailable,
            // but still surfaces its (zero) summary in the breakdown.
            Some(SourceResult::Available(data)) => SourceScore {
                kind: ws.kind,
                weight: ws.weight,
                score: None,
                summary: Some(data.summary),
                is_fallback: data.is_fallback,
            },
            _ => SourceScore {
                kind: ws.kind,
                weight: ws.weight,
                score: None,
                summary: None,
                is_fallback: false,
            },
        };
        breakdown.push(row);
    }

    let (score, had_any_data) = if weight_seen > 0.0 {
        ((score_acc / weight_seen).round() as i32, true)
    } else {
        (NEUTRAL_SCORE, false)
    };

    AggregateOutcome {
        score: score.clamp(0, 100),
        had_any_data,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::types::{SourceData, UnavailableReason};
    use crate::summary::{Label, SentimentSummary};

    fn summary(positive: u32, negative: u32, neutral: u32) -> SentimentSummary {
        let mut s = SentimentSummary::default();
        for _ in 0..positive {
            s.record(Label::Positive);
        }
        for _ in 0..negative {
            s.record(Label::Negative);
        }
        for _ in 0..neutral {
            s.record(Label::Neutral);
        }
        s
    }

    fn available(positive: u32, total: u32) -> SourceResult {
        assert!(total >= positive);
        SourceResult::Available(SourceData {
            summary: summary(positive, total - positive, 0),
            mentions: Vec::new(),
            raw_count: total as usize,
            is_fallback: false,
            query_used: "test".into(),
        })
    }

    fn unavailable() -> SourceResult {
        SourceResult::Unavailable(UnavailableReason::Upstream("down".into()))
    }

    #[test]
    fn all_unavailable_yields_neutral_default() {
        let rs = [unavailable(), unavailable(), unavailable(), unavailable()];
        let results = vec![
            (SourceKind::Social, &rs[0]),
            (SourceKind::News, &rs[1]),
            (SourceKind::Microblog, &rs[2]),
            (SourceKind::Reviews, &rs[3]),
        ];
        let out = aggregate(&results, &SourceWeightsConfig::default_seed());
        assert_eq!(out.score, 50);
        assert!(!out.had_any_data);
        assert!(out.breakdown.iter().all(|row| row.score.is_none()));
    }

    #[test]
    fn single_source_renormalizes_instead_of_diluting() {
        let social = available(10, 10);
        let results = vec![(SourceKind::Social, &social)];
        let out = aggregate(&results, &SourceWeightsConfig::default_seed());
        assert_eq!(out.score, 100);
        assert!(out.had_any_data);
    }

    #[test]
    fn four_source_acme_scenario() {
        // 8/10, 6/10, 5/10, 7/10 at default weights:
        // round(0.3*80 + 0.25*60 + 0.2*50 + 0.25*70) = 67
        let rs = [
            available(8, 10),
            available(6, 10),
            available(5, 10),
            available(7, 10),
        ];
        let results = vec![
            (SourceKind::Social, &rs[0]),
            (SourceKind::News, &rs[1]),
            (SourceKind::Microblog, &rs[2]),
            (SourceKind::Reviews, &rs[3]),
        ];
        let out = aggregate(&results, &SourceWeightsConfig::default_seed());
        assert_eq!(out.score, 67);
    }

    #[test]
    fn two_available_two_unavailable_scenario() {
        // news 3/10, reviews 9/10, both weight 0.25:
        // weight_seen 0.5, round((30*0.25 + 90*0.25) / 0.5) = 60
        let news = available(3, 10);
        let reviews = available(9, 10);
        let down = unavailable();
        let results = vec![
            (SourceKind::Social, &down),
            (SourceKind::News, &news),
            (SourceKind::Microblog, &down),
            (SourceKind::Reviews, &reviews),
        ];
        let out = aggregate(&results, &SourceWeightsConfig::default_seed());
        assert_eq!(out.score, 60);
    }

    #[test]
    fn present_but_empty_is_excluded_not_penalized() {
        let empty = available(0, 0);
        let good = available(9, 10);
        let results = vec![(SourceKind::Social, &empty), (SourceKind::News, &good)];
        let out = aggregate(&results, &SourceWeightsConfig::default_seed());
        // Only news contributes: score stays 90, not dragged toward 0 or 50.
        assert_eq!(out.score, 90);
        assert!(out.had_any_data);
        let social_row = &out.breakdown[0];
        assert!(social_row.score.is_none());
        assert_eq!(social_row.summary, Some(SentimentSummary::default()));
    }

    #[test]
    fn aggregate_is_deterministic() {
        let a = available(7, 13);
        let b = available(2, 9);
        let results = vec![(SourceKind::Social, &a), (SourceKind::Reviews, &b)];
        let w = SourceWeightsConfig::default_seed();
        let first = aggregate(&results, &w);
        let second = aggregate(&results, &w);
        assert_eq!(first.score, second.score);
        assert_eq!(first.had_any_data, second.had_any_data);
    }

    #[test]
    fn default_seed_weights_sum_to_one() {
        let w = SourceWeightsConfig::default_seed();
        let sum: f32 = w.sources.iter().map(|s| s.weight).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(w.weight_for(SourceKind::Social), Some(0.30));
        assert_eq!(w.weight_for(SourceKind::Microblog), Some(0.20));
    }

    #[test]
    fn invalid_weights_file_falls_back_to_seed() {
        let cfg = SourceWeightsConfig::load_from_file("does-not-exist.json");
        assert_eq!(cfg.sources.len(), 4);
    }
}
