//! 기업/ETF 메타데이터.

use crate::types::{Percentage, Ticker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 기업 개요.
///
/// 수치 필드가 보고되지 않은 경우 `CompanyProfile::UNKNOWN`(-1)을 저장합니다.
/// 0은 실제로 보고된 값입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub ticker: Ticker,
    /// 회사명
    pub name: String,
    /// 사업 설명
    pub description: String,
    /// PER
    pub pe_ratio: f64,
    /// 발행 주식 수
    pub shares_outstanding: i64,
    /// 유통 주식 수
    pub shares_float: i64,
    /// 공매도 잔고
    pub shares_short: i64,
}

impl CompanyProfile {
    /// 미보고 수치 sentinel
    pub const UNKNOWN: i64 = -1;

    /// 수치 필드를 모두 미보고로 채운 프로필 생성.
    pub fn new(ticker: Ticker, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ticker,
            name: name.into(),
            description: description.into(),
            pe_ratio: Self::UNKNOWN as f64,
            shares_outstanding: Self::UNKNOWN,
            shares_float: Self::UNKNOWN,
            shares_short: Self::UNKNOWN,
        }
    }

    /// 보고된 PER (미보고 시 None).
    pub fn pe_ratio(&self) -> Option<f64> {
        (self.pe_ratio != Self::UNKNOWN as f64).then_some(self.pe_ratio)
    }

    pub fn shares_outstanding(&self) -> Option<i64> {
        known(self.shares_outstanding)
    }

    pub fn shares_float(&self) -> Option<i64> {
        known(self.shares_float)
    }

    pub fn shares_short(&self) -> Option<i64> {
        known(self.shares_short)
    }
}

fn known(value: i64) -> Option<i64> {
    (value != CompanyProfile::UNKNOWN).then_some(value)
}

/// ETF 개요.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfProfile {
    pub ticker: Ticker,
    /// 펀드명
    pub name: String,
}

impl EtfProfile {
    pub fn new(ticker: Ticker, name: impl Into<String>) -> Self {
        Self {
            ticker,
            name: name.into(),
        }
    }
}

/// ETF 보유 종목 (보유 티커 -> 비중 %).
pub type Holdings = BTreeMap<Ticker, Percentage>;

/// 데이터 소스가 반환하는 ETF 개요 + 보유 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfOverview {
    pub profile: EtfProfile,
    pub holdings: Holdings,
}

/// 보유 종목 한 행 (조회용).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: Ticker,
    pub percent: Percentage,
}
