//! 가격/비중 저장 정밀도를 위한 Decimal 유틸리티.
//!
//! 가격은 `NUMERIC(13,4)`, ETF 비중은 `NUMERIC(6,2)` 컬럼에 저장됩니다.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// 가격 타입.
pub type Price = Decimal;

/// 퍼센트 타입 (7.1 = 7.1%).
pub type Percentage = Decimal;

/// 가격 소수점 자릿수
pub const PRICE_SCALE: u32 = 4;

/// 비중 소수점 자릿수
pub const PERCENT_SCALE: u32 = 2;

/// `NUMERIC(13,4)`로 표현 가능한 최대 절대값
pub const MAX_PRICE: Decimal = dec!(999999999.9999);

/// 저장 정밀도 반올림 확장 트레이트.
pub trait DecimalExt {
    /// 가격 정밀도(소수점 4자리)로 반올림합니다.
    fn round_price(&self) -> Decimal;

    /// 비중 정밀도(소수점 2자리)로 반올림합니다.
    fn round_percent(&self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_price(&self) -> Decimal {
        self.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    fn round_percent(&self) -> Decimal {
        self.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// f64 가격을 Decimal로 변환 (NaN/무한대는 None).
pub fn price_from_f64(value: f64) -> Option<Price> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.round_price())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_f64_rounds() {
        assert_eq!(price_from_f64(12.345678), Some(dec!(12.3457)));
        assert_eq!(price_from_f64(f64::NAN), None);
        assert_eq!(price_from_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_round_percent_storage_scale() {
        assert_eq!(dec!(7.1).round_percent(), dec!(7.10));
        assert_eq!(dec!(0.305).round_percent(), dec!(0.31));
    }
}
