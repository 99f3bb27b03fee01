//! 일별 가격 데이터.
//!
//! - `PricePoint` - (심볼, 거래일) 단위의 OHLCV + 수정 종가
//! - `FetchMode` - 전체 이력 / 최근 구간 수집 모드

use crate::error::ValidationError;
use crate::types::{Price, Ticker, MAX_PRICE};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 일별 가격 행.
///
/// 자연 키는 (심볼, 거래일)입니다. 여덟 개 필드가 모두 있어야만 저장됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 티커
    pub ticker: Ticker,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 수정 종가 (분할/배당 반영)
    pub adjusted_close: Price,
    /// 거래량
    pub volume: i64,
}

impl PricePoint {
    /// 저장 가능한 행인지 검증합니다.
    ///
    /// 음수 가격/거래량, 고가 < 저가, `NUMERIC(13,4)` 범위 초과는 잘못된 행입니다.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adjusted_close", self.adjusted_close),
        ];

        for (name, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(self.malformed(format!("{} 음수: {}", name, value)));
            }
            if value > MAX_PRICE {
                return Err(self.malformed(format!("{} 범위 초과: {}", name, value)));
            }
        }

        if self.high < self.low {
            return Err(self.malformed(format!("고가({}) < 저가({})", self.high, self.low)));
        }

        if self.volume < 0 {
            return Err(self.malformed(format!("거래량 음수: {}", self.volume)));
        }

        Ok(())
    }

    fn malformed(&self, reason: String) -> ValidationError {
        ValidationError::MalformedPrice {
            ticker: self.ticker.to_string(),
            date: self.date.to_string(),
            reason,
        }
    }
}

/// 가격 이력 수집 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// 상장 이후 전체 이력
    Full,
    /// 최근 구간만 (기본 100일)
    #[default]
    Recent,
}

impl FetchMode {
    /// `full` 플래그에서 변환합니다.
    pub fn from_full(full: bool) -> Self {
        if full {
            Self::Full
        } else {
            Self::Recent
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Recent => write!(f, "recent"),
        }
    }
}
