//! 심볼 분류 (기업 / ETF / 미지원).

use serde::{Deserialize, Serialize};
use std::fmt;

/// 추적 대상 심볼 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Company,
    Etf,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Company => write!(f, "company"),
            Self::Etf => write!(f, "etf"),
        }
    }
}

/// 분류 결과.
///
/// 두 개의 독립 bool 대신 하나의 태그 값으로 표현합니다.
/// `Failed`는 "기업이 아님"과 다른 일시적 실패(네트워크, rate limit)입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Company,
    Etf,
    /// 기업도 ETF도 아님 (지수 심볼 포함)
    Unsupported,
    /// 분류 요청 자체가 실패
    Failed(String),
}
