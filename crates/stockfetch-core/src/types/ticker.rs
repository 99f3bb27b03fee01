//! 티커 심볼 및 심볼 식별자 정의.
//!
//! - `Ticker` - 정규화된(공백 제거, 대문자) 티커 문자열
//! - `SymbolId` - 저장소가 부여하는 숫자 식별자

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 정규화된 티커 심볼.
///
/// 앞뒤 공백을 제거하고 대문자로 변환한 값만 보관합니다.
/// `^`로 시작하는 심볼은 지수(index)로 취급됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// 최대 티커 길이 (symbols.ticker 컬럼 길이와 동일)
    pub const MAX_LEN: usize = 50;

    /// 문자열을 티커로 파싱합니다.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_uppercase();

        if normalized.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if normalized.len() > Self::MAX_LEN {
            return Err(ValidationError::InvalidTicker {
                ticker: normalized,
                reason: format!("{}자를 초과합니다", Self::MAX_LEN),
            });
        }
        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-')))
        {
            return Err(ValidationError::InvalidTicker {
                reason: format!("허용되지 않는 문자 '{}'", c),
                ticker: normalized,
            });
        }

        Ok(Self(normalized))
    }

    /// 문자열 참조 반환.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 지수 심볼(`^GSPC` 등) 여부.
    pub fn is_index(&self) -> bool {
        self.0.starts_with('^')
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 심볼의 숫자 식별자 (symbols.id).
///
/// 최초 생성 시 저장소가 부여하며 이후 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct SymbolId(pub i64);

impl SymbolId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
