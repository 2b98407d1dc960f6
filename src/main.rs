//! Unified Reputation Analyzer — Binary Entrypoint
//! Boots the Axum HTTP server, wiring collectors, shared state, and middleware.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reputation_analyzer::api::{self, AppState};
use reputation_analyzer::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - REPUTATION_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("REPUTATION_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reputation_analyzer=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // NEWS_API_KEY / SERPAPI_KEY / GEMINI_API_KEY and the config path
    // overrides without exporting them by hand.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let state = AppState::from_env();
    let metrics = Metrics::init(state.settings.gateway_deadline_secs);

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
