//! 수집 모듈.

pub mod ingest;
pub mod progress;

pub use ingest::{
    IngestOptions, IngestOutcome, IngestRequest, Ingestor, MetadataRefresh, OutcomeKind,
};
pub use progress::{IngestPhase, ProgressEvent};
