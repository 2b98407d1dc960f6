//! # Insight / Narrative Generator
//! Provider abstraction over an external text-generation oracle with a
//! mandatory deterministic fallback. The oracle is a capability injected as
//! `Arc<dyn InsightClient>`; when it is disabled, unreachable, or slow, the
//! templated sentence embedding the numeric counts is returned instead.
//! Narration never fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::collect::types::{SourceKind, SourceResult};
use crate::summary::SentimentSummary;

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Set to "mock" to get a deterministic client in tests/local runs.
pub const ENV_INSIGHT_TEST_MODE: &str = "INSIGHT_TEST_MODE";

// ------------------------------------------------------------
// Config
// ------------------------------------------------------------

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_max_output_tokens() -> u32 {
    800
}
fn default_temperature() -> f32 {
    0.7
}

/// Loaded from `config/insight.json`; disabled when absent or unparseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

pub fn load_insight_config() -> InsightConfig {
    let path = Path::new("config/insight.json");
    match std::fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => InsightConfig::default(),
    }
}

// ------------------------------------------------------------
// Client surface
// ------------------------------------------------------------

/// Bounded text-generation call. `None` means the oracle declined or failed;
/// callers must fall back to a template.
#[async_trait]
pub trait InsightClient: Send + Sync {
    async fn narrate(&self, prompt: &str) -> Option<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynInsightClient = Arc<dyn InsightClient>;

/// Factory honoring the test hook and credential policy:
/// * `INSIGHT_TEST_MODE=mock` yields a deterministic mock client;
/// * disabled config or a missing `GEMINI_API_KEY` yields the disabled
///   client (templated fallback everywhere), never a default key.
pub fn build_client_from_config(config: &InsightConfig) -> DynInsightClient {
    if std::env::var(ENV_INSIGHT_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClient {
            fixed: "Neutral reputation outlook (mock).".to_string(),
        });
    }
    if !config.enabled {
        return Arc::new(DisabledClient);
    }
    match std::env::var(ENV_GEMINI_API_KEY)
        .ok()
        .filter(|k| !k.trim().is_empty())
    {
        Some(api_key) => Arc::new(GeminiClient::new(api_key, config.clone())),
        None => {
            warn!("insight oracle enabled but {ENV_GEMINI_API_KEY} is not set; narration will use templates");
            Arc::new(DisabledClient)
        }
    }
}

/// Always declines; used when the oracle is disabled or has no credential.
pub struct DisabledClient;

#[async_trait]
impl InsightClient for DisabledClient {
    async fn narrate(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests/local runs.
pub struct MockClient {
    pub fixed: String,
}

#[async_trait]
impl InsightClient for MockClient {
    async fn narrate(&self, _prompt: &str) -> Option<String> {
        Some(self.fixed.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Gemini `generateContent` REST provider.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    config: InsightConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, config: InsightConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("reputation-analyzer/0.1 (reputation sentiment service)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            config,
        }
    }
}

#[async_trait]
impl InsightClient for GeminiClient {
    async fn narrate(&self, prompt: &str) -> Option<String> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            max_output_tokens: u32,
            temperature: f32,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: String,
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.model
        );
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "insight oracle returned an error status");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .unwrap_or("");
        if text.is_empty() {
            None
        } else {
            Some(strip_emphasis(text))
        }
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

/// Remove bold-markup delimiters the oracle likes to inject.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}

// ------------------------------------------------------------
// Prompts, templates, and never-failing wrappers
// ------------------------------------------------------------

/// Per-source count lines for the unified prompt.
fn data_summary_lines(summaries: &[(SourceKind, SentimentSummary)]) -> String {
    summaries
        .iter()
        .map(|(kind, s)| {
            format!(
                "{}: {} positive, {} negative, {} neutral",
                kind.display_name(),
                s.positive,
                s.negative,
                s.neutral
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn build_unified_prompt(
    company: &str,
    score: i32,
    summaries: &[(SourceKind, SentimentSummary)],
    hints: &[(SourceKind, String)],
) -> String {
    let hint_lines = hints
        .iter()
        .map(|(kind, h)| format!("- {}: {}", kind.display_name(), h))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Comprehensive reputation analysis for \"{company}\":\n\n\
         Overall Reputation Score: {score}/100\n\n\
         Data Sources Analysis:\n{}\n\n\
         Key Insights from Individual Sources:\n{hint_lines}\n\n\
         Provide:\n\
         1. Overall reputation assessment\n\
         2. Top 3 priority areas for improvement\n\
         3. Strategic recommendations for reputation management\n\
         4. Platform-specific action items\n\n\
         Keep response comprehensive but concise.",
        data_summary_lines(summaries)
    )
}

/// Deterministic unified narrative used whenever the oracle is unavailable.
pub fn unified_fallback(company: &str, score: i32) -> String {
    format!(
        "Unified analysis: {company} has a reputation score of {score}/100. \
         Focus on improving customer engagement across all platforms based on the collected data."
    )
}

/// Deterministic per-source hint embedding the counts.
pub fn source_hint(kind: SourceKind, summary: &SentimentSummary) -> String {
    let noun = match kind {
        SourceKind::Social | SourceKind::Microblog => "posts",
        SourceKind::News => "articles",
        SourceKind::Reviews => "reviews",
    };
    let focus = match kind {
        SourceKind::Social | SourceKind::Microblog => {
            "addressing customer service issues and product quality concerns mentioned in discussions"
        }
        SourceKind::News => "addressing negative coverage themes",
        SourceKind::Reviews => "addressing service quality issues",
    };
    format!(
        "{} analysis: {} positive, {} negative {noun} found. Focus on {focus}.",
        kind.display_name(),
        summary.positive,
        summary.negative
    )
}

/// Short company brief with a deterministic fallback.
pub async fn company_brief(client: &dyn InsightClient, company: &str) -> String {
    let prompt = format!(
        "Provide a brief 2-sentence overview of {company} - what industry and what they're known for."
    );
    match client.narrate(&prompt).await {
        Some(text) => strip_emphasis(&text),
        None => format!("{company} is a company under analysis. Brief information temporarily unavailable."),
    }
}

/// Unified narrative; falls back to the template and never errors.
pub async fn narrate_unified(
    client: &dyn InsightClient,
    company: &str,
    score: i32,
    summaries: &[(SourceKind, SentimentSummary)],
    hints: &[(SourceKind, String)],
) -> String {
    let prompt = build_unified_prompt(company, score, summaries, hints);
    match client.narrate(&prompt).await {
        Some(text) => strip_emphasis(&text),
        None => unified_fallback(company, score),
    }
}

/// Keyword-frequency extraction over negative mention texts. The
/// deterministic path of the original's key-issue mining; cheap and
/// oracle-free.
pub fn extract_key_issues(negative_texts: &[String]) -> Vec<String> {
    const STOPWORDS: &[&str] = &[
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should", "this", "that", "they", "their", "about", "from",
    ];
    let mut counts: HashMap<String, u32> = HashMap::new();
    for text in negative_texts {
        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if word.len() > 3 && !STOPWORDS.contains(&word) {
                *counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().filter(|(_, c)| *c > 1).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(5)
        .map(|(word, count)| format!("Frequent mention of: {word} (mentioned {count} times)"))
        .collect()
}

/// Per-source hints for every source that reported data, templated.
pub fn hints_for(results: &[(SourceKind, SourceResult)]) -> Vec<(SourceKind, String)> {
    results
        .iter()
        .filter_map(|(kind, result)| {
            result
                .as_available()
                .map(|data| (*kind, source_hint(*kind, &data.summary)))
        })
        .collect()
}
