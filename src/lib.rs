// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod collect;
pub mod insight;
pub mod metrics;
pub mod sentiment;
pub mod summary;
pub mod trend;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, AggregateOutcome, SourceWeightsConfig};
pub use crate::api::{router, AppState};
pub use crate::collect::types::{Collector, CompanyQuery, SourceKind, SourceResult};
pub use crate::summary::{normalize, SentimentSummary};
