// src/collect/fallback.rs
//
// Fixture-backed fallback datasets. Extracted to fixtures/ so the core
// logic stays independent of whether an adapter's data is real; the only
// trace of provenance is the `is_fallback` tag on the result.

use once_cell::sync::Lazy;

use crate::collect::types::SourceKind;
use crate::summary::RawMention;

static SOCIAL: Lazy<Vec<RawMention>> = Lazy::new(|| parse(include_str!("../../fixtures/social_fallback.json")));
static NEWS: Lazy<Vec<RawMention>> = Lazy::new(|| parse(include_str!("../../fixtures/news_fallback.json")));
static MICROBLOG: Lazy<Vec<RawMention>> =
    Lazy::new(|| parse(include_str!("../../fixtures/microblog_fallback.json")));
static REVIEWS: Lazy<Vec<RawMention>> =
    Lazy::new(|| parse(include_str!("../../fixtures/reviews_fallback.json")));

fn parse(raw: &str) -> Vec<RawMention> {
    serde_json::from_str(raw).expect("valid fallback fixture")
}

/// Fixture mentions for `kind` with the `{company}` placeholder substituted.
pub fn mentions_for(kind: SourceKind, company: &str) -> Vec<RawMention> {
    let template = match kind {
        SourceKind::Social => &*SOCIAL,
        SourceKind::News => &*NEWS,
        SourceKind::Microblog => &*MICROBLOG,
        SourceKind::Reviews => &*REVIEWS,
    };
    let name = if company.trim().is_empty() {
        "the company"
    } else {
        company.trim()
    };
    template
        .iter()
        .map(|m| {
            let mut filled = m.clone();
            filled.text = filled.text.replace("{company}", name);
            filled
        })
        .collect()
}
