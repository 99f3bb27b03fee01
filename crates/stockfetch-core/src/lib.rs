//! # Stockfetch Core
//!
//! 주식/ETF 가격 이력 수집 시스템의 핵심 도메인 타입을 제공합니다:
//! - 티커 정규화와 심볼 식별자
//! - 일별 가격 행과 수집 모드
//! - 기업/ETF 메타데이터와 분류 결과
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
