//! 주식/ETF 가격 이력 수집기.
//!
//! 이 crate는 수집 오케스트레이터와 CLI 바이너리를 제공합니다:
//! - 심볼 분류 후 가격 시계열 저장
//! - 기업 개요 / ETF 보유 종목 수집
//! - 배치 수집 (진행 이벤트, 협력적 취소, 선택적 동시 실행)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use modules::{
    IngestOptions, IngestOutcome, IngestPhase, IngestRequest, Ingestor, MetadataRefresh,
    OutcomeKind, ProgressEvent,
};
pub use stats::CollectionStats;
