// src/collect/social.rs
//
// Social-forum collector against Reddit's public search API. No credential
// required; the listing endpoint only needs a descriptive User-Agent.

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::collect::config::CollectorSettings;
use crate::collect::types::{
    Collector, CompanyQuery, SourceData, SourceKind, SourceResult, UnavailableReason,
};
use crate::collect::{clean_text, resolve_failure, MIN_TEXT_LEN};
use crate::sentiment::SentimentOracle;
use crate::summary::{normalize, RawMention};

const SEARCH_URL: &str = "https://www.reddit.com/search.json";
const PAGE_LIMIT: u32 = 25;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    permalink: String,
    author: Option<String>,
    created_utc: Option<f64>,
}

pub struct SocialCollector {
    http: reqwest::Client,
    settings: Arc<CollectorSettings>,
    oracle: Arc<dyn SentimentOracle>,
}

impl SocialCollector {
    pub fn new(settings: Arc<CollectorSettings>, oracle: Arc<dyn SentimentOracle>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("reputation-analyzer/0.1 (reputation sentiment service)")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(settings.timeout())
            .build()
            .expect("reqwest client");
        Self {
            http,
            settings,
            oracle,
        }
    }

    async fn search(&self, query: &str) -> anyhow::Result<Vec<RawMention>> {
        let listing: Listing = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("limit", &PAGE_LIMIT.to_string()),
                ("sort", "relevance"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = Vec::new();
        for child in listing.data.children {
            let post = child.data;
            let title = clean_text(&post.title);
            if title.len() <= MIN_TEXT_LEN {
                continue;
            }
            let body = clean_text(&post.selftext);
            let text = if body.is_empty() {
                title
            } else {
                format!("{title} {body}")
            };
            out.push(RawMention {
                text,
                rating: None,
                author: post.author,
                url: Some(format!("https://reddit.com{}", post.permalink)),
                published_at: post
                    .created_utc
                    .and_then(|ts| chrono::DateTime::from_timestamp(ts as i64, 0))
                    .map(|dt| dt.to_rfc3339()),
                engagement: None,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Collector for SocialCollector {
    async fn collect(&self, query: &CompanyQuery) -> SourceResult {
        let base = query.base_query();
        let mut mentions: Vec<RawMention> = Vec::new();
        let mut upstream_reached = false;

        for (i, variant) in query
            .variants(&self.settings.social_suffixes)
            .iter()
            .enumerate()
        {
            if mentions.len() >= self.settings.max_results {
                break;
            }
            if i > 0 {
                tokio::time::sleep(self.settings.pacing()).await;
            }
            match self.search(variant).await {
                Ok(found) => {
                    upstream_reached = true;
                    debug!(source = "social", %variant, count = found.len(), "search variant done");
                    for m in found {
                        if mentions.len() >= self.settings.max_results {
                            break;
                        }
                        if !mentions.iter().any(|e| e.url == m.url) {
                            mentions.push(m);
                        }
                    }
                }
                Err(e) => {
                    warn!(source = "social", %variant, error = ?e, "search variant failed");
                }
            }
        }

        if mentions.is_empty() {
            let reason = if upstream_reached {
                UnavailableReason::NoResults
            } else {
                UnavailableReason::Upstream("forum search unreachable".into())
            };
            return resolve_failure(
                self.kind(),
                query,
                base,
                reason,
                &self.settings,
                self.oracle.as_ref(),
            );
        }

        counter!("collect_items_total", "source" => "social").increment(mentions.len() as u64);
        let raw_count = mentions.len();
        let (summary, analyzed) = normalize(&mentions, self.oracle.as_ref());
        SourceResult::Available(SourceData {
            summary,
            mentions: analyzed,
            raw_count,
            is_fallback: false,
            query_used: base,
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }
}
