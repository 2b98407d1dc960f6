//! # Sentiment Oracle
//! Lexicon-based polarity scoring behind a swappable trait so tests (and a
//! future model-backed scorer) can substitute a deterministic stub.
//!
//! The default analyzer sums word valences from an embedded lexicon, flips
//! the sign of a word when a negator appears within the previous three
//! tokens, and squashes the raw sum into `[-1, 1]`.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Squashing constant: |sum| >= ~4 lands near the ends of the scale.
const NORMALIZATION_ALPHA: f32 = 15.0;

/// Opaque polarity scorer. Implementations must be pure and panic-free.
pub trait SentimentOracle: Send + Sync {
    /// Compound polarity of `text` in `[-1.0, 1.0]`; 0.0 for empty/unknown text.
    fn polarity(&self, text: &str) -> f32;
}

/// Default oracle backed by the embedded valence lexicon.
#[derive(Debug, Clone, Default)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_valence(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }
}

impl SentimentOracle for LexiconAnalyzer {
    fn polarity(&self, text: &str) -> f32 {
        // Collect into a vector because negation looks back at prior tokens.
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_valence(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            // Is there a negator in the last 1..=3 tokens?
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            sum += if negated { -base } else { base };
        }

        normalize_score(sum)
    }
}

/// Squash an integer valence sum into `[-1, 1]`.
fn normalize_score(sum: i32) -> f32 {
    if sum == 0 {
        return 0.0;
    }
    let s = sum as f32;
    let norm = s / (s * s + NORMALIZATION_ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}

/// Alphanumeric tokens, lower-cased. Apostrophes stay inside tokens so
/// contractions like "isn't" survive as single negators.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Single-token negators ("no longer" is covered by "no" after tokenization).
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "hardly"
            | "barely"
    )
}
