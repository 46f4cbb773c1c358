//! FIRMS hotspot ingestion: fetch per satellite source, parse and normalize the CSV rows,
//! merge duplicates across sources, cache, and summarize.

pub mod cache;
pub mod fetcher;
pub mod merge;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod rules;
pub mod stats;
pub mod types;

pub use fetcher::{FirmsClient, SourceFetcher};
pub use pipeline::{DetectionSet, FireService, FireServiceSettings, PipelineError, StatisticsReport};
pub use query::{DetectionQuery, QueryError};
pub use stats::StatisticsSnapshot;
pub use types::{FireDetection, SourceError};
