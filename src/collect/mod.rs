//! # Collectors
//! Fan-out to the four upstream reputation sources. Each adapter shares the
//! same shape: broaden the query through configured variants, pace calls,
//! normalize what comes back, and resolve every failure into data.

pub mod config;
pub mod fallback;
pub mod microblog;
pub mod news;
pub mod reviews;
pub mod social;
pub mod types;

use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;

use crate::collect::config::CollectorSettings;
use crate::collect::types::{
    Collector, CompanyQuery, SourceData, SourceKind, SourceResult, UnavailableReason,
};
use crate::sentiment::SentimentOracle;
use crate::summary::normalize;

static RE_HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("html tag regex"));
static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://\S+|\bwww\.\S+").expect("url regex"));
static RE_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[\w\-]+(@[\w\-.]+)?").expect("handle regex"));

/// Strip markup, links, and fediverse handles; collapse whitespace.
/// Hashtag markers are dropped but their words kept.
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let no_tags = RE_HTML_TAG.replace_all(&decoded, " ");
    let no_urls = RE_URL.replace_all(&no_tags, " ");
    let no_handles = RE_HANDLE.replace_all(&no_urls, " ");
    let no_hash = no_handles.replace('#', "");
    no_hash.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Minimum meaningful mention length after cleaning.
pub const MIN_TEXT_LEN: usize = 10;

/// Shared failure policy: serve the provenance-tagged fixture dataset when
/// fallback is enabled, otherwise surface the reason as `Unavailable`.
pub fn resolve_failure(
    kind: SourceKind,
    query: &CompanyQuery,
    query_used: String,
    reason: UnavailableReason,
    settings: &CollectorSettings,
    oracle: &dyn SentimentOracle,
) -> SourceResult {
    if !settings.fallback_enabled {
        counter!("collect_unavailable_total", "source" => kind.key()).increment(1);
        return SourceResult::Unavailable(reason);
    }
    tracing::info!(source = %kind, %reason, "serving fallback dataset");
    counter!("collect_fallback_total", "source" => kind.key()).increment(1);
    let mentions = fallback::mentions_for(kind, &query.company);
    let raw_count = mentions.len();
    let (summary, analyzed) = normalize(&mentions, oracle);
    SourceResult::Available(SourceData {
        summary,
        mentions: analyzed,
        raw_count,
        is_fallback: true,
        query_used,
    })
}

/// Run every collector concurrently, each under its own deadline, and keep
/// whatever resolved. A slow or failing source degrades to
/// `Unavailable(TimedOut)` without delaying or aborting the others.
pub async fn collect_all(
    collectors: &[Arc<dyn Collector>],
    query: &CompanyQuery,
    deadline: std::time::Duration,
) -> Vec<(SourceKind, SourceResult)> {
    let mut handles = Vec::with_capacity(collectors.len());
    for collector in collectors {
        let collector = Arc::clone(collector);
        let query = query.clone();
        let kind = collector.kind();
        handles.push((
            kind,
            tokio::spawn(async move {
                let started = Instant::now();
                let result = tokio::time::timeout(deadline, collector.collect(&query)).await;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
                histogram!("collect_duration_ms", "source" => kind.key()).record(elapsed_ms);
                match result {
                    Ok(r) => r,
                    Err(_) => {
                        tracing::warn!(source = %kind, "collector exceeded gateway deadline");
                        counter!("collect_timeout_total", "source" => kind.key()).increment(1);
                        SourceResult::Unavailable(UnavailableReason::TimedOut)
                    }
                }
            }),
        ));
    }

    let mut out = Vec::with_capacity(handles.len());
    for (kind, handle) in handles {
        let result = match handle.await {
            Ok(r) => r,
            // A panicked task must not take the request down with it.
            Err(e) => {
                tracing::error!(source = %kind, error = ?e, "collector task failed");
                SourceResult::Unavailable(UnavailableReason::Upstream("task failed".into()))
            }
        };
        out.push((kind, result));
    }
    out
}
