//! # API Gateway
//! Single composition endpoint plus one sub-endpoint per source. The
//! gateway fans out to all collectors concurrently, blends whatever arrived,
//! and always answers; per-source absence shows up as `null` entries in
//! `data_sources`, never as a top-level failure.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::aggregate::{aggregate, AggregateOutcome, SourceWeightsConfig};
use crate::collect::config::CollectorSettings;
use crate::collect::types::{
    Collector, CompanyQuery, SourceData, SourceKind, SourceResult, UnavailableReason,
};
use crate::collect::{collect_all, microblog, news, reviews, social};
use crate::insight::{self, DynInsightClient};
use crate::sentiment::{LexiconAnalyzer, SentimentOracle};
use crate::trend::synthesize_trend;

#[derive(Clone)]
pub struct AppState {
    pub collectors: Vec<Arc<dyn Collector>>,
    pub insight: DynInsightClient,
    pub weights: Arc<SourceWeightsConfig>,
    pub settings: Arc<CollectorSettings>,
}

impl AppState {
    pub fn new(
        collectors: Vec<Arc<dyn Collector>>,
        insight: DynInsightClient,
        weights: SourceWeightsConfig,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            collectors,
            insight,
            weights: Arc::new(weights),
            settings: Arc::new(settings),
        }
    }

    /// Production wiring: lexicon oracle, the four live collectors, and the
    /// configured insight client.
    pub fn from_env() -> Self {
        let settings = Arc::new(CollectorSettings::load_default());
        let oracle: Arc<dyn SentimentOracle> = Arc::new(LexiconAnalyzer::new());
        let collectors: Vec<Arc<dyn Collector>> = vec![
            Arc::new(social::SocialCollector::new(
                Arc::clone(&settings),
                Arc::clone(&oracle),
            )),
            Arc::new(news::NewsCollector::new(
                Arc::clone(&settings),
                Arc::clone(&oracle),
            )),
            Arc::new(microblog::MicroblogCollector::new(
                Arc::clone(&settings),
                Arc::clone(&oracle),
            )),
            Arc::new(reviews::ReviewsCollector::new(
                Arc::clone(&settings),
                Arc::clone(&oracle),
            )),
        ];
        let insight = insight::build_client_from_config(&insight::load_insight_config());
        Self {
            collectors,
            insight,
            weights: Arc::new(SourceWeightsConfig::load_from_file("source_weights.json")),
            settings,
        }
    }

    fn collector(&self, kind: SourceKind) -> Option<&Arc<dyn Collector>> {
        self.collectors.iter().find(|c| c.kind() == kind)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/unified-analysis", get(unified_analysis))
        .route("/api/social", get(social_analysis))
        .route("/api/news", get(news_analysis))
        .route("/api/microblog", get(microblog_analysis))
        .route("/api/reviews", post(reviews_analysis))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalysisParams {
    company: Option<String>,
    #[serde(rename = "type")]
    company_type: Option<String>,
    location: Option<String>,
}

#[derive(serde::Deserialize)]
struct ReviewsBody {
    company: Option<String>,
    category: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

fn missing_parameter(name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("Missing '{name}' parameter") })),
    )
        .into_response()
}

/// Convert params into a query, or reject before any collector runs.
fn company_query(params: AnalysisParams) -> Result<CompanyQuery, Response> {
    match params.company.filter(|c| !c.trim().is_empty()) {
        Some(company) => Ok(CompanyQuery {
            company: company.trim().to_string(),
            company_type: params.company_type.filter(|t| !t.trim().is_empty()),
            location: params.location.filter(|l| !l.trim().is_empty()),
        }),
        None => Err(missing_parameter("company")),
    }
}

// ------------------------------------------------------------
// Unified gateway
// ------------------------------------------------------------

async fn unified_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
) -> Response {
    let query = match company_query(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    counter!("unified_requests_total").increment(1);
    info!(company = %query.company, "starting unified analysis");

    let results = collect_all(&state.collectors, &query, state.settings.gateway_deadline()).await;
    let outcome = aggregate(
        &results
            .iter()
            .map(|(kind, r)| (*kind, r))
            .collect::<Vec<_>>(),
        &state.weights,
    );

    let hints = insight::hints_for(&results);
    let summaries: Vec<_> = results
        .iter()
        .filter_map(|(kind, r)| r.as_available().map(|d| (*kind, d.summary)))
        .collect();
    let narrative = insight::narrate_unified(
        state.insight.as_ref(),
        &query.company,
        outcome.score,
        &summaries,
        &hints,
    )
    .await;

    let trend = synthesize_trend(outcome.overall_positive_ratio());
    let breakdown = source_breakdown(&outcome);
    let total_mentions: usize = results
        .iter()
        .filter_map(|(_, r)| r.as_available())
        .map(|d| d.raw_count)
        .sum();

    let mut data_sources = serde_json::Map::new();
    for (kind, result) in &results {
        let entry = match result.as_available() {
            Some(data) => source_payload(*kind, data, &state.settings),
            None => Value::Null,
        };
        data_sources.insert(kind.key().to_string(), entry);
    }

    Json(json!({
        "company": query.company,
        "reputation_score": outcome.score,
        "had_any_data": outcome.had_any_data,
        "unified_insights": narrative,
        "trend_data": trend,
        "trend_is_derived": true,
        "source_breakdown": breakdown,
        "data_sources": Value::Object(data_sources),
        "analysis_timestamp": chrono::Utc::now().to_rfc3339(),
        "total_mentions": total_mentions,
    }))
    .into_response()
}

/// Breakdown rows for sources that reported mentions, with share
/// percentages over the total.
fn source_breakdown(outcome: &AggregateOutcome) -> Vec<Value> {
    let rows: Vec<(SourceKind, u32)> = outcome
        .breakdown
        .iter()
        .filter_map(|row| row.summary.filter(|s| s.total > 0).map(|s| (row.kind, s.total)))
        .collect();
    let total: u32 = rows.iter().map(|(_, v)| v).sum();
    rows.into_iter()
        .map(|(kind, value)| {
            let percentage = if total > 0 {
                ((value as f32 / total as f32) * 100.0).round() as u32
            } else {
                0
            };
            json!({
                "name": kind.display_name(),
                "value": value,
                "color": kind.color(),
                "percentage": percentage,
            })
        })
        .collect()
}

/// The per-source payload embedded in `data_sources` and returned by the
/// sub-endpoints. Key names vary per source; the shape does not.
fn source_payload(kind: SourceKind, data: &SourceData, settings: &CollectorSettings) -> Value {
    let (items_key, count_key, insight_key) = match kind {
        SourceKind::Social => ("posts", "post_count", "ai_suggestions"),
        SourceKind::News => ("articles", "article_count", "ai_insights"),
        SourceKind::Microblog => ("posts", "post_count", "ai_insights"),
        SourceKind::Reviews => ("reviews", "review_count", "ai_insights"),
    };
    let capped: Vec<_> = data.mentions.iter().take(settings.response_cap).collect();
    let provenance = if data.is_fallback {
        format!("Fallback {} data (upstream unavailable)", kind.key())
    } else {
        format!("Real {} data", kind.key())
    };
    let mut payload = json!({
        items_key: capped,
        "sentiment_analysis": data.summary,
        insight_key: insight::source_hint(kind, &data.summary),
        "query_used": data.query_used,
        count_key: data.raw_count,
        "source": provenance,
        "is_real_data": !data.is_fallback,
    });
    if kind == SourceKind::Microblog {
        payload["instances_searched"] = json!(settings.microblog_instances);
    }
    payload
}

// ------------------------------------------------------------
// Per-source sub-endpoints
// ------------------------------------------------------------

fn unavailable_response(kind: SourceKind, reason: &UnavailableReason, query_used: &str) -> Response {
    match reason {
        UnavailableReason::NoResults => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No {} items found.", kind.key()),
                "reasons": [
                    "No recent items about this company",
                    "Search query too specific",
                    "Upstream API limitations",
                ],
                "searched_query": query_used,
                "suggestion": "Try a different company name or check if the company has recent activity",
            })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": format!("Error analyzing {} data: {other}", kind.key()),
                "suggestion": format!(
                    "The {} analysis service might be temporarily unavailable. Try again later.",
                    kind.key()
                ),
            })),
        )
            .into_response(),
    }
}

async fn run_single(state: &AppState, kind: SourceKind, query: &CompanyQuery) -> Response {
    let Some(collector) = state.collector(kind) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": format!("No collector configured for {}", kind.key()),
                "suggestion": "Check the service configuration.",
            })),
        )
            .into_response();
    };
    counter!("source_requests_total", "source" => kind.key()).increment(1);

    let deadline = state.settings.gateway_deadline();
    let result = match tokio::time::timeout(deadline, collector.collect(query)).await {
        Ok(r) => r,
        Err(_) => SourceResult::Unavailable(UnavailableReason::TimedOut),
    };

    match result {
        SourceResult::Available(data) => {
            let mut payload = source_payload(kind, &data, &state.settings);
            if kind == SourceKind::Social {
                // The social endpoint carries the richer extras the
                // dashboard shows on its detail panel.
                payload["company_brief"] =
                    json!(insight::company_brief(state.insight.as_ref(), &query.company).await);
                let negative_texts: Vec<String> = data
                    .mentions
                    .iter()
                    .filter(|m| m.sentiment_label == crate::summary::Label::Negative)
                    .map(|m| m.mention.text.clone())
                    .collect();
                payload["key_issues"] = json!(insight::extract_key_issues(&negative_texts));
            }
            Json(payload).into_response()
        }
        SourceResult::Unavailable(reason) => {
            unavailable_response(kind, &reason, &query.base_query())
        }
    }
}

async fn social_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
) -> Response {
    match company_query(params) {
        Ok(query) => run_single(&state, SourceKind::Social, &query).await,
        Err(resp) => resp,
    }
}

async fn news_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
) -> Response {
    match company_query(params) {
        Ok(query) => run_single(&state, SourceKind::News, &query).await,
        Err(resp) => resp,
    }
}

async fn microblog_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
) -> Response {
    match company_query(params) {
        Ok(query) => run_single(&state, SourceKind::Microblog, &query).await,
        Err(resp) => resp,
    }
}

async fn reviews_analysis(
    State(state): State<AppState>,
    Json(body): Json<ReviewsBody>,
) -> Response {
    let Some(company) = body.company.filter(|c| !c.trim().is_empty()) else {
        return missing_parameter("company");
    };
    let Some(category) = body.category.filter(|c| !c.trim().is_empty()) else {
        return missing_parameter("category");
    };
    let query = CompanyQuery {
        company: company.trim().to_string(),
        company_type: Some(category.trim().to_string()),
        location: body.location.filter(|l| !l.trim().is_empty()),
    };
    run_single(&state, SourceKind::Reviews, &query).await
}
