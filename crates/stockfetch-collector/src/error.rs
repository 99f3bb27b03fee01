//! 에러 타입 정의.
//!
//! 심볼 단위 수집 실패는 에러가 아니라 `IngestOutcome`으로 보고됩니다.
//! 이 타입은 설정 로드, DB 연결 같은 실행 준비 단계의 실패만 다룹니다.

use stockfetch_core::ValidationError;
use stockfetch_data::{DataError, SourceError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 저장소 에러
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 데이터 소스 초기화 에러
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    /// 입력 검증 에러 (잘못된 티커 등)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
