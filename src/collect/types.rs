// src/collect/types.rs
//
// The collector contract: every upstream source is a replaceable unit
// behind `collect(query) -> SourceResult`. Failures cross this boundary as
// data, never as errors or panics.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::summary::{AnalyzedMention, SentimentSummary};

/// The four configured reputation sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[serde(rename = "social-forum")]
    Social,
    News,
    Microblog,
    Reviews,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Social,
        SourceKind::News,
        SourceKind::Microblog,
        SourceKind::Reviews,
    ];

    /// Display name used in the breakdown payload.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Social => "Social",
            SourceKind::News => "News",
            SourceKind::Microblog => "Microblog",
            SourceKind::Reviews => "Reviews",
        }
    }

    /// Key used in `data_sources` and metrics labels.
    pub fn key(self) -> &'static str {
        match self {
            SourceKind::Social => "social",
            SourceKind::News => "news",
            SourceKind::Microblog => "microblog",
            SourceKind::Reviews => "reviews",
        }
    }

    /// Chart color used by the dashboard breakdown.
    pub fn color(self) -> &'static str {
        match self {
            SourceKind::Social => "#FF6B6B",
            SourceKind::News => "#45B7D1",
            SourceKind::Microblog => "#4ECDC4",
            SourceKind::Reviews => "#96CEB4",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The incoming company query, shared by all collectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyQuery {
    pub company: String,
    pub company_type: Option<String>,
    pub location: Option<String>,
}

impl CompanyQuery {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            company_type: None,
            location: None,
        }
    }

    /// `"<company> <type>"`, trimmed.
    pub fn base_query(&self) -> String {
        match &self.company_type {
            Some(t) if !t.trim().is_empty() => format!("{} {}", self.company.trim(), t.trim()),
            _ => self.company.trim().to_string(),
        }
    }

    /// Broadened query variants: the base query first, then one per suffix,
    /// then a location-scoped variant when a location hint is present.
    /// Duplicates are dropped while preserving order.
    pub fn variants(&self, suffixes: &[String]) -> Vec<String> {
        let base = self.base_query();
        let mut out = vec![base.clone()];
        for suffix in suffixes {
            let v = format!("{base} {suffix}");
            if !out.contains(&v) {
                out.push(v);
            }
        }
        if let Some(loc) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            let v = format!("{base} near {}", loc.trim());
            if !out.contains(&v) {
                out.push(v);
            }
        }
        out
    }
}

/// Why a collector produced no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Required credential env var is not set. Never substituted with a
    /// default key.
    MissingCredential(String),
    /// Upstream reachable in principle but the call failed (network, auth,
    /// rate limit, bad payload).
    Upstream(String),
    /// Upstream reached, zero matching items, and fallback disabled.
    NoResults,
    /// The gateway-side deadline elapsed before the collector resolved.
    TimedOut,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::MissingCredential(var) => {
                write!(f, "missing credential: {var} is not set")
            }
            UnavailableReason::Upstream(detail) => write!(f, "upstream unavailable: {detail}"),
            UnavailableReason::NoResults => f.write_str("no matching items found"),
            UnavailableReason::TimedOut => f.write_str("collector timed out"),
        }
    }
}

/// Everything a collector hands to the aggregator and the API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceData {
    pub summary: SentimentSummary,
    pub mentions: Vec<AnalyzedMention>,
    /// Items found upstream before the response-size cap.
    pub raw_count: usize,
    /// True when the mentions come from the fixture dataset rather than a
    /// live upstream. Disclosed to callers as `is_real_data = !is_fallback`.
    pub is_fallback: bool,
    pub query_used: String,
}

/// Tagged outcome of one collector call. Produced by the adapter, consumed
/// once by the aggregator; no shared mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceResult {
    Available(SourceData),
    Unavailable(UnavailableReason),
}

impl SourceResult {
    pub fn as_available(&self) -> Option<&SourceData> {
        match self {
            SourceResult::Available(data) => Some(data),
            SourceResult::Unavailable(_) => None,
        }
    }
}

/// One reputation source. Implementations must apply their variant-query
/// retry strategy, pacing, and timeout internally, and must resolve every
/// failure mode into a `SourceResult`.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self, query: &CompanyQuery) -> SourceResult;
    fn kind(&self) -> SourceKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_query_includes_type_when_present() {
        let mut q = CompanyQuery::new("Acme");
        assert_eq!(q.base_query(), "Acme");
        q.company_type = Some("software".into());
        assert_eq!(q.base_query(), "Acme software");
        q.company_type = Some("   ".into());
        assert_eq!(q.base_query(), "Acme");
    }

    #[test]
    fn variants_start_with_base_and_dedup() {
        let q = CompanyQuery::new("Acme");
        let suffixes = vec!["company".to_string(), "review".to_string()];
        let v = q.variants(&suffixes);
        assert_eq!(v, vec!["Acme", "Acme company", "Acme review"]);
    }

    #[test]
    fn variants_append_location_hint() {
        let mut q = CompanyQuery::new("Acme");
        q.location = Some("Boston".into());
        let v = q.variants(&[]);
        assert_eq!(v, vec!["Acme", "Acme near Boston"]);
    }

    #[test]
    fn source_kind_keys_are_stable() {
        assert_eq!(SourceKind::Social.key(), "social");
        assert_eq!(SourceKind::Social.display_name(), "Social");
        assert_eq!(SourceKind::Reviews.color(), "#96CEB4");
    }

    #[test]
    fn unavailable_reason_displays() {
        let r = UnavailableReason::MissingCredential("NEWS_API_KEY".into());
        assert!(r.to_string().contains("NEWS_API_KEY"));
        assert_eq!(UnavailableReason::NoResults.to_string(), "no matching items found");
    }
}
