// src/collect/news.rs
//
// News collector against a NewsAPI-style `everything` endpoint. The API key
// comes from NEWS_API_KEY only; a missing key is a recoverable
// MissingCredential condition, never a shared default.

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

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: u32 = 15;
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";

#[derive(Debug, Deserialize)]
struct Everything {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    description: Option<String>,
    source: Option<ArticleSource>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

pub struct NewsCollector {
    http: reqwest::Client,
    api_key: Option<String>,
    settings: Arc<CollectorSettings>,
    oracle: Arc<dyn SentimentOracle>,
}

impl NewsCollector {
    pub fn new(settings: Arc<CollectorSettings>, oracle: Arc<dyn SentimentOracle>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("reputation-analyzer/0.1 (reputation sentiment service)")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(settings.timeout())
            .build()
            .expect("reqwest client");
        let api_key = std::env::var(ENV_NEWS_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            http,
            api_key,
            settings,
            oracle,
        }
    }

    async fn search(&self, query: &str, api_key: &str) -> anyhow::Result<Vec<RawMention>> {
        let page: Everything = self
            .http
            .get(EVERYTHING_URL)
            .query(&[
                ("q", query),
                ("apiKey", api_key),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("pageSize", &PAGE_SIZE.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = Vec::new();
        for article in page.articles {
            let title = clean_text(&article.title);
            if title.len() <= MIN_TEXT_LEN {
                continue;
            }
            let text = match article.description.as_deref().map(clean_text) {
                Some(desc) if !desc.is_empty() => format!("{title}. {desc}"),
                _ => title,
            };
            out.push(RawMention {
                text,
                rating: None,
                author: article.source.and_then(|s| s.name),
                url: article.url,
                published_at: article.published_at,
                engagement: None,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Collector for NewsCollector {
    async fn collect(&self, query: &CompanyQuery) -> SourceResult {
        let base = query.base_query();

        let Some(api_key) = self.api_key.as_deref() else {
            return resolve_failure(
                self.kind(),
                query,
                base,
                UnavailableReason::MissingCredential(ENV_NEWS_API_KEY.into()),
                &self.settings,
                self.oracle.as_ref(),
            );
        };

        let mut mentions: Vec<RawMention> = Vec::new();
        let mut upstream_reached = false;

        // First variant that returns anything wins; broadening further only
        // dilutes relevance for news.
        for (i, variant) in query
            .variants(&self.settings.news_suffixes)
            .iter()
            .enumerate()
        {
            if i > 0 {
                tokio::time::sleep(self.settings.pacing()).await;
            }
            match self.search(variant, api_key).await {
                Ok(found) => {
                    upstream_reached = true;
                    debug!(source = "news", %variant, count = found.len(), "search variant done");
                    if !found.is_empty() {
                        mentions = found;
                        break;
                    }
                }
                Err(e) => {
                    warn!(source = "news", %variant, error = ?e, "search variant failed");
                }
            }
        }

        if mentions.is_empty() {
            let reason = if upstream_reached {
                UnavailableReason::NoResults
            } else {
                UnavailableReason::Upstream("news search unreachable".into())
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

        mentions.truncate(self.settings.max_results);
        counter!("collect_items_total", "source" => "news").increment(mentions.len() as u64);
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
        SourceKind::News
    }
}
