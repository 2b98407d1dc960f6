// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with stub
// collectors injected through AppState.
//
// Covered:
// - GET /health
// - GET /api/unified-analysis (400, full payload, degradation, renormalization)
// - per-source sub-endpoints (200 / 404 / 500 / 400 shapes)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use reputation_analyzer::aggregate::SourceWeightsConfig;
use reputation_analyzer::api::{self, AppState};
use reputation_analyzer::collect::config::CollectorSettings;
use reputation_analyzer::collect::types::{
    Collector, CompanyQuery, SourceData, SourceKind, SourceResult, UnavailableReason,
};
use reputation_analyzer::insight::DisabledClient;
use reputation_analyzer::summary::{AnalyzedMention, Label, RawMention, SentimentSummary};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct StubCollector {
    kind: SourceKind,
    result: SourceResult,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Collector for StubCollector {
    async fn collect(&self, _query: &CompanyQuery) -> SourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
    fn kind(&self) -> SourceKind {
        self.kind
    }
}

fn available(positive: u32, total: u32, is_fallback: bool) -> SourceResult {
    assert!(total >= positive);
    let mentions = (0..total)
        .map(|i| AnalyzedMention {
            mention: RawMention::from_text(format!("mention {i}")),
            sentiment_score: if i < positive { 0.5 } else { -0.5 },
            sentiment_label: if i < positive {
                Label::Positive
            } else {
                Label::Negative
            },
        })
        .collect();
    SourceResult::Available(SourceData {
        summary: SentimentSummary {
            positive,
            negative: total - positive,
            neutral: 0,
            total,
        },
        mentions,
        raw_count: total as usize,
        is_fallback,
        query_used: "Acme".into(),
    })
}

fn unavailable(reason: UnavailableReason) -> SourceResult {
    SourceResult::Unavailable(reason)
}

/// Router with one stub per source; returns the per-source call counters.
fn stub_router(results: [SourceResult; 4]) -> (Router, [Arc<AtomicUsize>; 4]) {
    let counters = [
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    ];
    let [social, news, microblog, reviews] = results;
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(StubCollector {
            kind: SourceKind::Social,
            result: social,
            calls: Arc::clone(&counters[0]),
        }),
        Arc::new(StubCollector {
            kind: SourceKind::News,
            result: news,
            calls: Arc::clone(&counters[1]),
        }),
        Arc::new(StubCollector {
            kind: SourceKind::Microblog,
            result: microblog,
            calls: Arc::clone(&counters[2]),
        }),
        Arc::new(StubCollector {
            kind: SourceKind::Reviews,
            result: reviews,
            calls: Arc::clone(&counters[3]),
        }),
    ];
    let state = AppState::new(
        collectors,
        Arc::new(DisabledClient),
        SourceWeightsConfig::default_seed(),
        CollectorSettings::default(),
    );
    (api::router(state), counters)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json: Json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let (app, _) = stub_router([
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
    ]);
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("body");
    assert_eq!(std::str::from_utf8(&bytes).unwrap().trim(), "ok");
}

#[tokio::test]
async fn unified_missing_company_is_400_and_no_collector_runs() {
    let (app, counters) = stub_router([
        available(5, 10, false),
        available(5, 10, false),
        available(5, 10, false),
        available(5, 10, false),
    ]);
    let (status, body) = get_json(app, "/api/unified-analysis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("company"));
    for c in &counters {
        assert_eq!(c.load(Ordering::SeqCst), 0, "collector ran on a 400");
    }
}

#[tokio::test]
async fn unified_empty_company_is_400() {
    let (app, counters) = stub_router([
        available(5, 10, false),
        available(5, 10, false),
        available(5, 10, false),
        available(5, 10, false),
    ]);
    let (status, _) = get_json(app, "/api/unified-analysis?company=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(counters[0].load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unified_full_payload_shape_and_score() {
    // 8/10, 6/10, 5/10, 7/10 at default weights -> 67.
    let (app, counters) = stub_router([
        available(8, 10, false),
        available(6, 10, false),
        available(5, 10, false),
        available(7, 10, false),
    ]);
    let (status, body) = get_json(app, "/api/unified-analysis?company=Acme").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["company"], "Acme");
    assert_eq!(body["reputation_score"], 67);
    assert_eq!(body["had_any_data"], true);
    assert_eq!(body["total_mentions"], 40);
    assert_eq!(body["trend_is_derived"], true);
    assert_eq!(body["trend_data"].as_array().unwrap().len(), 7);
    for point in body["trend_data"].as_array().unwrap() {
        assert!(point["date"].as_str().unwrap().starts_with("Day "));
        for band in ["positive", "neutral", "negative"] {
            let v = point[band].as_u64().unwrap();
            assert!(v <= 100);
        }
    }

    // Four equal-volume sources: 25% each.
    let breakdown = body["source_breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 4);
    for row in breakdown {
        assert_eq!(row["value"], 10);
        assert_eq!(row["percentage"], 25);
        assert!(row["color"].as_str().unwrap().starts_with('#'));
    }

    // Disabled oracle -> deterministic fallback narrative with the score.
    assert!(body["unified_insights"]
        .as_str()
        .unwrap()
        .contains("67/100"));

    let ds = body["data_sources"].as_object().unwrap();
    for key in ["social", "news", "microblog", "reviews"] {
        assert!(!ds[key].is_null(), "{key} should be present");
        assert_eq!(ds[key]["is_real_data"], true);
    }
    assert!(!ds["microblog"]["instances_searched"]
        .as_array()
        .unwrap()
        .is_empty());

    assert!(body["analysis_timestamp"].as_str().unwrap().contains('T'));
    for c in &counters {
        assert_eq!(c.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn unified_all_unavailable_degrades_to_neutral_default() {
    let (app, _) = stub_router([
        unavailable(UnavailableReason::Upstream("down".into())),
        unavailable(UnavailableReason::MissingCredential("NEWS_API_KEY".into())),
        unavailable(UnavailableReason::TimedOut),
        unavailable(UnavailableReason::NoResults),
    ]);
    let (status, body) = get_json(app, "/api/unified-analysis?company=Acme").await;
    assert_eq!(status, StatusCode::OK, "degradation must not fail the request");
    assert_eq!(body["reputation_score"], 50);
    assert_eq!(body["had_any_data"], false);
    assert_eq!(body["total_mentions"], 0);
    let ds = body["data_sources"].as_object().unwrap();
    for key in ["social", "news", "microblog", "reviews"] {
        assert!(ds[key].is_null());
    }
    assert_eq!(body["source_breakdown"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unified_single_source_renormalizes() {
    let (app, _) = stub_router([
        available(10, 10, false),
        unavailable(UnavailableReason::Upstream("down".into())),
        unavailable(UnavailableReason::Upstream("down".into())),
        unavailable(UnavailableReason::Upstream("down".into())),
    ]);
    let (status, body) = get_json(app, "/api/unified-analysis?company=Acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reputation_score"], 100);
    assert_eq!(body["had_any_data"], true);
}

#[tokio::test]
async fn unified_discloses_fallback_provenance() {
    let (app, _) = stub_router([
        available(5, 10, true),
        available(5, 10, false),
        unavailable(UnavailableReason::Upstream("down".into())),
        unavailable(UnavailableReason::Upstream("down".into())),
    ]);
    let (_, body) = get_json(app, "/api/unified-analysis?company=Acme").await;
    let ds = body["data_sources"].as_object().unwrap();
    assert_eq!(ds["social"]["is_real_data"], false);
    assert!(ds["social"]["source"].as_str().unwrap().contains("Fallback"));
    assert_eq!(ds["news"]["is_real_data"], true);
}

#[tokio::test]
async fn social_endpoint_returns_extras() {
    let (app, _) = stub_router([
        available(3, 5, false),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
    ]);
    let (status, body) = get_json(app, "/api/social?company=Acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post_count"], 5);
    assert_eq!(body["sentiment_analysis"]["positive"], 3);
    assert!(body["ai_suggestions"].as_str().unwrap().contains("positive"));
    assert!(body["company_brief"].as_str().unwrap().contains("Acme"));
    assert!(body["key_issues"].is_array());
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn news_endpoint_no_results_is_404() {
    let (app, _) = stub_router([
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
    ]);
    let (status, body) = get_json(app, "/api/news?company=Acme").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());
    assert!(body["suggestion"].as_str().is_some());
    assert_eq!(body["searched_query"], "Acme");
}

#[tokio::test]
async fn microblog_endpoint_upstream_failure_is_500() {
    let (app, _) = stub_router([
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::Upstream("no instance reachable".into())),
        unavailable(UnavailableReason::NoResults),
    ]);
    let (status, body) = get_json(app, "/api/microblog?company=Acme").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("microblog"));
    assert!(body["suggestion"].as_str().is_some());
}

#[tokio::test]
async fn reviews_post_requires_company_and_category() {
    let (app, counters) = stub_router([
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        available(4, 4, false),
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/api/reviews")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "company": "Acme" }).to_string()))
        .expect("build POST /api/reviews");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(counters[3].load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reviews_post_happy_path() {
    let (app, _) = stub_router([
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        unavailable(UnavailableReason::NoResults),
        available(4, 4, false),
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/api/reviews")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "company": "Acme", "category": "software", "location": "Boston" }).to_string(),
        ))
        .expect("build POST /api/reviews");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("body");
    let body: Json = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["review_count"], 4);
    assert_eq!(body["is_real_data"], true);
    assert!(body["ai_insights"].as_str().is_some());
}
