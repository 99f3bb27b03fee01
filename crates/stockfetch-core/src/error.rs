//! 도메인 값 검증 에러 타입.

use thiserror::Error;

/// 티커나 가격 행이 도메인 규칙을 만족하지 못할 때의 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 빈 티커
    #[error("티커가 비어 있습니다")]
    EmptyTicker,

    /// 형식이 잘못된 티커
    #[error("잘못된 티커 '{ticker}': {reason}")]
    InvalidTicker { ticker: String, reason: String },

    /// 저장할 수 없는 가격 행
    #[error("잘못된 가격 데이터 ({ticker} {date}): {reason}")]
    MalformedPrice {
        ticker: String,
        date: String,
        reason: String,
    },

    /// 알 수 없는 설정 값
    #[error("알 수 없는 값 '{value}' ({field})")]
    UnknownVariant { field: &'static str, value: String },
}
