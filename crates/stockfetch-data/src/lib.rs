//! 데이터 저장 및 외부 시장 데이터 소스.
//!
//! 이 crate는 다음을 제공합니다:
//! - PostgreSQL 저장소 (심볼 레지스트리, 가격, 기업, ETF)
//! - 외부 소스 어댑터 (Yahoo 가격, Alpha Vantage 기업 개요, MarketWatch ETF 보유 종목)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result, SourceError};

// 저장소 타입 재내보내기
pub use storage::{
    CompanyRepository, Database, DatabaseConfig, EtfRepository, HoldingsPolicy, PriceRecord,
    PriceRepository, StockRepository, StockStore, SymbolRegistry, TrackedSymbol, UpsertReport,
};

// 데이터 소스 재내보내기
pub use provider::{
    build_http_client, AlphaVantageClient, HttpMarketDataSource, MarketDataSource,
    MarketWatchClient, SourceConfig, YahooChartClient,
};
