// src/collect/reviews.rs
//
// Business-reviews collector: a places search resolves the company to a
// place id, then the reviews endpoint pulls rated review snippets. Key from
// SERPAPI_KEY only; absence is a recoverable MissingCredential condition.

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::collect::config::CollectorSettings;
use crate::collect::types::{
    Collector, CompanyQuery, SourceData, SourceKind, SourceResult, UnavailableReason,
};
use crate::collect::{clean_text, resolve_failure};
use crate::sentiment::SentimentOracle;
use crate::summary::{normalize, RawMention};

const SEARCH_URL: &str = "https://serpapi.com/search.json";
pub const ENV_SERPAPI_KEY: &str = "SERPAPI_KEY";

#[derive(Debug, Deserialize)]
struct PlacesPage {
    #[serde(default)]
    local_results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    place_id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewsPage {
    #[serde(default)]
    reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
struct Review {
    rating: Option<f32>,
    snippet: Option<String>,
    date: Option<String>,
    user: Option<ReviewUser>,
}

#[derive(Debug, Deserialize)]
struct ReviewUser {
    name: Option<String>,
}

pub struct ReviewsCollector {
    http: reqwest::Client,
    api_key: Option<String>,
    settings: Arc<CollectorSettings>,
    oracle: Arc<dyn SentimentOracle>,
}

impl ReviewsCollector {
    pub fn new(settings: Arc<CollectorSettings>, oracle: Arc<dyn SentimentOracle>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("reputation-analyzer/0.1 (reputation sentiment service)")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(settings.timeout())
            .build()
            .expect("reqwest client");
        let api_key = std::env::var(ENV_SERPAPI_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            http,
            api_key,
            settings,
            oracle,
        }
    }

    async fn find_place(&self, query: &str, api_key: &str) -> anyhow::Result<Option<Place>> {
        let page: PlacesPage = self
            .http
            .get(SEARCH_URL)
            .query(&[("engine", "google_maps"), ("q", query), ("api_key", api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page.local_results.into_iter().find(|p| p.place_id.is_some()))
    }

    async fn fetch_reviews(&self, place_id: &str, api_key: &str) -> anyhow::Result<Vec<RawMention>> {
        let page: ReviewsPage = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("engine", "google_maps_reviews"),
                ("place_id", place_id),
                ("api_key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut out = Vec::new();
        for review in page.reviews {
            let text = review.snippet.as_deref().map(clean_text).unwrap_or_default();
            if text.is_empty() && review.rating.is_none() {
                continue;
            }
            out.push(RawMention {
                text,
                rating: review
                    .rating
                    .map(|r| r.round().clamp(1.0, 5.0) as u8),
                author: review.user.and_then(|u| u.name),
                url: None,
                published_at: review.date,
                engagement: None,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Collector for ReviewsCollector {
    async fn collect(&self, query: &CompanyQuery) -> SourceResult {
        let base = query.base_query();

        let Some(api_key) = self.api_key.as_deref() else {
            return resolve_failure(
                self.kind(),
                query,
                base,
                UnavailableReason::MissingCredential(ENV_SERPAPI_KEY.into()),
                &self.settings,
                self.oracle.as_ref(),
            );
        };

        // Place lookup tries the plain query first, then the location-scoped
        // variant; the first hit wins.
        let mut place: Option<Place> = None;
        let mut upstream_reached = false;
        for (i, variant) in query.variants(&[]).iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.pacing()).await;
            }
            match self.find_place(variant, api_key).await {
                Ok(found) => {
                    upstream_reached = true;
                    debug!(source = "reviews", %variant, found = found.is_some(), "place lookup done");
                    if found.is_some() {
                        place = found;
                        break;
                    }
                }
                Err(e) => {
                    warn!(source = "reviews", %variant, error = ?e, "place lookup failed");
                }
            }
        }

        let mentions = match place.as_ref().and_then(|p| p.place_id.as_deref()) {
            Some(place_id) => match self.fetch_reviews(place_id, api_key).await {
                Ok(mut reviews) => {
                    reviews.truncate(self.settings.max_results);
                    reviews
                }
                Err(e) => {
                    warn!(source = "reviews", error = ?e, "reviews fetch failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if mentions.is_empty() {
            let reason = if upstream_reached {
                UnavailableReason::NoResults
            } else {
                UnavailableReason::Upstream("places search unreachable".into())
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

        counter!("collect_items_total", "source" => "reviews").increment(mentions.len() as u64);
        let raw_count = mentions.len();
        let (summary, analyzed) = normalize(&mentions, self.oracle.as_ref());
        SourceResult::Available(SourceData {
            summary,
            mentions: analyzed,
            raw_count,
            is_fallback: false,
            query_used: place
                .and_then(|p| p.title)
                .unwrap_or(base),
        })
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Reviews
    }
}
