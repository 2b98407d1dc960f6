// src/collect/microblog.rs
//
// Microblog collector against Mastodon hashtag timelines. Public endpoint,
// no credential; several instances are tried in turn and their posts merged.

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
use crate::summary::{normalize, Engagement, RawMention};

const TAG_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    content: String,
    created_at: Option<String>,
    #[serde(default)]
    reblogs_count: u32,
    #[serde(default)]
    favourites_count: u32,
    #[serde(default)]
    replies_count: u32,
    account: Option<Account>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    username: Option<String>,
}

/// Hashtag form of the company name: alphanumerics only, lower-case.
pub fn hashtag_for(company: &str) -> String {
    company
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

pub struct MicroblogCollector {
    http: reqwest::Client,
    settings: Arc<CollectorSettings>,
    oracle: Arc<dyn SentimentOracle>,
}

impl MicroblogCollector {
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

    async fn tag_timeline(&self, instance: &str, hashtag: &str) -> anyhow::Result<Vec<RawMention>> {
        let url = format!("https://{instance}/api/v1/timelines/tag/{hashtag}");
        let statuses: Vec<Status> = self
            .http
            .get(&url)
            .query(&[("limit", TAG_LIMIT.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = Vec::new();
        for status in statuses {
            let text = clean_text(&status.content);
            if text.len() <= MIN_TEXT_LEN {
                continue;
            }
            out.push(RawMention {
                text,
                rating: None,
                author: status.account.and_then(|a| a.username),
                url: status.url,
                published_at: status.created_at,
                engagement: Some(Engagement {
                    boosts: status.reblogs_count,
                    favourites: status.favourites_count,
                    replies: status.replies_count,
                }),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Collector for MicroblogCollector {
    async fn collect(&self, query: &CompanyQuery) -> SourceResult {
        let base = query.base_query();
        let hashtag = hashtag_for(&query.company);
        if hashtag.is_empty() {
            return resolve_failure(
                self.kind(),
                query,
                base,
                UnavailableReason::NoResults,
                &self.settings,
                self.oracle.as_ref(),
            );
        }

        let mut mentions: Vec<RawMention> = Vec::new();
        let mut upstream_reached = false;

        for (i, instance) in self.settings.microblog_instances.iter().enumerate() {
            if mentions.len() >= self.settings.max_results {
                break;
            }
            if i > 0 {
                tokio::time::sleep(self.settings.pacing()).await;
            }
            match self.tag_timeline(instance, &hashtag).await {
                Ok(found) => {
                    upstream_reached = true;
                    debug!(source = "microblog", %instance, count = found.len(), "tag timeline done");
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
                    warn!(source = "microblog", %instance, error = ?e, "tag timeline failed");
                }
            }
        }

        if mentions.is_empty() {
            let reason = if upstream_reached {
                UnavailableReason::NoResults
            } else {
                UnavailableReason::Upstream("no microblog instance reachable".into())
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

        counter!("collect_items_total", "source" => "microblog").increment(mentions.len() as u64);
        let raw_count = mentions.len();
        let (summary, analyzed) = normalize(&mentions, self.oracle.as_ref());
        SourceResult::Available(SourceData {
            summary,
            mentions: analyzed,
            raw_count,
            is_fallback: false,
            query_used: format!("#{hashtag}"),
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Microblog
    }
}
