//! # SentimentSummary Normalizer
//! Turns a source-specific mention list into the common sentiment schema:
//! per-mention polarity in `[-1, 1]`, a three-way label, and bucket counts
//! with the invariant `positive + negative + neutral == total`.

use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentOracle;

/// Classification thresholds on the compound polarity score.
pub const POSITIVE_THRESHOLD: f32 = 0.05;
pub const NEGATIVE_THRESHOLD: f32 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    pub fn from_score(score: f32) -> Self {
        if score >= POSITIVE_THRESHOLD {
            Label::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Label::Negative
        } else {
            Label::Neutral
        }
    }
}

/// Bucket counts over classified mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub total: u32,
}

impl SentimentSummary {
    pub fn record(&mut self, label: Label) {
        match label {
            Label::Positive => self.positive += 1,
            Label::Negative => self.negative += 1,
            Label::Neutral => self.neutral += 1,
        }
        self.total += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Share of positive mentions in `[0, 1]`; 0.0 when empty.
    pub fn positive_ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.positive as f32 / self.total as f32
        }
    }
}

/// Engagement counters carried through for display; never used for scoring.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub boosts: u32,
    pub favourites: u32,
    pub replies: u32,
}

/// A single upstream item after source-specific cleaning, before scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMention {
    pub text: String,
    /// Discrete star rating 1..=5, present for review sources only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
}

impl RawMention {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A mention with its compound score and label attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedMention {
    #[serde(flatten)]
    pub mention: RawMention,
    pub sentiment_score: f32,
    pub sentiment_label: Label,
}

/// Map a 1-5 star rating onto the polarity scale.
fn rating_polarity(rating: u8) -> f32 {
    if rating >= 4 {
        0.5
    } else if rating <= 2 {
        -0.5
    } else {
        0.0
    }
}

/// Score and classify `items`. Empty input yields `{0, 0, 0, 0}` — callers
/// must treat that as present-but-empty, not unavailable.
pub fn normalize(
    items: &[RawMention],
    oracle: &dyn SentimentOracle,
) -> (SentimentSummary, Vec<AnalyzedMention>) {
    let mut summary = SentimentSummary::default();
    let mut analyzed = Vec::with_capacity(items.len());

    for item in items {
        let text_score = oracle.polarity(&item.text);
        // Star ratings carry signal of their own; average them in when present.
        let score = match item.rating {
            Some(r) => (text_score + rating_polarity(r)) / 2.0,
            None => text_score,
        };
        let label = Label::from_score(score);
        summary.record(label);
        analyzed.push(AnalyzedMention {
            mention: item.clone(),
            sentiment_score: score,
            sentiment_label: label,
        });
    }

    (summary, analyzed)
}
