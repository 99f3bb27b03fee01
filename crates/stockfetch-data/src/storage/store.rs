//! 수집기가 사용하는 저장소 인터페이스와 PostgreSQL 구현.

use super::{
    CompanyRepository, Database, EtfRepository, HoldingsPolicy, PriceRepository, SymbolRegistry,
    UpsertReport,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use stockfetch_core::{
    CompanyProfile, EtfProfile, Holding, Holdings, PricePoint, SymbolKind, Ticker,
};

/// 추적 중인 심볼 (기업 또는 ETF 개요가 저장된 심볼).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedSymbol {
    pub ticker: Ticker,
    pub kind: SymbolKind,
}

/// 수집 오케스트레이터가 의존하는 저장 연산.
///
/// 같은 심볼에 대한 동시 호출은 호출자가 피해야 합니다. 서로 다른 심볼은 동시에 호출해도 됩니다.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn upsert_prices(&self, ticker: &Ticker, points: &[PricePoint]) -> Result<UpsertReport>;

    async fn has_company(&self, ticker: &Ticker) -> Result<bool>;

    async fn upsert_company(&self, profile: &CompanyProfile) -> Result<()>;

    async fn has_etf(&self, ticker: &Ticker) -> Result<bool>;

    async fn upsert_etf(&self, profile: &EtfProfile) -> Result<()>;

    async fn replace_holdings(
        &self,
        etf: &Ticker,
        holdings: &Holdings,
        policy: HoldingsPolicy,
    ) -> Result<usize>;

    async fn list_company_tickers(&self) -> Result<Vec<Ticker>>;

    async fn list_etf_tickers(&self) -> Result<Vec<Ticker>>;
}

/// PostgreSQL 기반 저장소 묶음.
///
/// 하나의 `SymbolRegistry`(와 캐시)를 모든 하위 repository가 공유합니다.
#[derive(Clone)]
pub struct StockStore {
    db: Database,
    registry: SymbolRegistry,
    prices: PriceRepository,
    companies: CompanyRepository,
    etfs: EtfRepository,
}

impl StockStore {
    pub fn new(db: Database) -> Self {
        let registry = SymbolRegistry::new(db.clone());
        Self {
            prices: PriceRepository::new(db.clone(), registry.clone()),
            companies: CompanyRepository::new(db.clone(), registry.clone()),
            etfs: EtfRepository::new(db.clone(), registry.clone()),
            registry,
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// 기업과 ETF를 합친 추적 심볼 목록 (티커순).
    pub async fn list_tracked_symbols(&self) -> Result<Vec<TrackedSymbol>> {
        let companies = self.companies.list_tickers().await?;
        let etfs = self.etfs.list_tickers().await?;

        let mut tracked: Vec<TrackedSymbol> = companies
            .into_iter()
            .map(|ticker| TrackedSymbol {
                ticker,
                kind: SymbolKind::Company,
            })
            .chain(etfs.into_iter().map(|ticker| TrackedSymbol {
                ticker,
                kind: SymbolKind::Etf,
            }))
            .collect();
        tracked.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(tracked)
    }

    pub async fn get_company_profile(&self, ticker: &Ticker) -> Result<Option<CompanyProfile>> {
        self.companies.get(ticker).await
    }

    pub async fn get_etf_profile(&self, ticker: &Ticker) -> Result<Option<EtfProfile>> {
        self.etfs.get_profile(ticker).await
    }

    pub async fn get_etf_holdings(&self, ticker: &Ticker) -> Result<Vec<Holding>> {
        self.etfs.get_holdings(ticker).await
    }

    pub async fn get_price_history(&self, ticker: &Ticker) -> Result<Vec<PricePoint>> {
        self.prices.get_history(ticker).await
    }

    pub async fn get_price_history_range(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        self.prices.get_range(ticker, from, to).await
    }

    pub async fn has_price_data(&self, ticker: &Ticker) -> Result<bool> {
        self.prices.has_data(ticker).await
    }

    pub async fn latest_price_date(&self, ticker: &Ticker) -> Result<Option<NaiveDate>> {
        self.prices.latest_date(ticker).await
    }
}

#[async_trait]
impl StockRepository for StockStore {
    async fn upsert_prices(&self, ticker: &Ticker, points: &[PricePoint]) -> Result<UpsertReport> {
        self.prices.upsert_series(ticker, points).await
    }

    async fn has_company(&self, ticker: &Ticker) -> Result<bool> {
        self.companies.exists(ticker).await
    }

    async fn upsert_company(&self, profile: &CompanyProfile) -> Result<()> {
        self.companies.upsert(profile).await
    }

    async fn has_etf(&self, ticker: &Ticker) -> Result<bool> {
        self.etfs.exists(ticker).await
    }

    async fn upsert_etf(&self, profile: &EtfProfile) -> Result<()> {
        self.etfs.upsert_profile(profile).await
    }

    async fn replace_holdings(
        &self,
        etf: &Ticker,
        holdings: &Holdings,
        policy: HoldingsPolicy,
    ) -> Result<usize> {
        self.etfs.replace_holdings(etf, holdings, policy).await
    }

    async fn list_company_tickers(&self) -> Result<Vec<Ticker>> {
        self.companies.list_tickers().await
    }

    async fn list_etf_tickers(&self) -> Result<Vec<Ticker>> {
        self.etfs.list_tickers().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn assert_send<T: Send>(_: &T) {}

    // 연결 없이 future 타입만 확인 (poll 하지 않음)
    #[tokio::test]
    async fn test_write_futures_are_send() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/stockfetch")
            .unwrap();
        let store = StockStore::new(Database::from_pool(pool));
        let ticker = Ticker::parse("VOO").unwrap();
        let holdings = Holdings::new();

        let prices = store.prices.upsert_series(&ticker, &[]);
        assert_send(&prices);

        let replace = store
            .etfs
            .replace_holdings(&ticker, &holdings, HoldingsPolicy::Append);
        assert_send(&replace);
    }
}
