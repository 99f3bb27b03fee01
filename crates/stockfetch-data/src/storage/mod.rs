//! PostgreSQL 저장소.
//!
//! - `SymbolRegistry` - 티커 식별자와 캐시
//! - `PriceRepository` - 일별 가격 upsert / 조회
//! - `CompanyRepository`, `EtfRepository` - 메타데이터와 ETF 보유 종목
//! - `StockStore` - 위 저장소 묶음이자 `StockRepository` 구현

pub mod company;
pub mod database;
pub mod etf;
pub mod price;
pub mod registry;
pub mod store;

pub use company::CompanyRepository;
pub use database::{Database, DatabaseConfig};
pub use etf::{EtfRepository, HoldingsPolicy};
pub use price::{PriceRecord, PriceRepository, UpsertReport};
pub use registry::SymbolRegistry;
pub use store::{StockRepository, StockStore, TrackedSymbol};
