//! HTTP 소스 통합.

use super::{
    build_http_client, AlphaVantageClient, MarketDataSource, MarketWatchClient, SourceConfig,
    YahooChartClient,
};
use crate::error::SourceError;
use async_trait::async_trait;
use stockfetch_core::{CompanyProfile, EtfOverview, FetchMode, PricePoint, Ticker};
use tracing::info;

/// 가격은 Yahoo, 기업 개요는 Alpha Vantage, ETF는 MarketWatch에서 가져오는 소스.
///
/// 세 클라이언트는 하나의 `reqwest::Client`(연결 풀)를 공유합니다.
#[derive(Clone)]
pub struct HttpMarketDataSource {
    prices: YahooChartClient,
    companies: AlphaVantageClient,
    etfs: MarketWatchClient,
}

impl HttpMarketDataSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = build_http_client(config)?;

        info!(
            connect_timeout_secs = config.connect_timeout.as_secs(),
            read_timeout_secs = config.read_timeout.as_secs(),
            recent_days = config.recent_days,
            "HTTP 데이터 소스 초기화"
        );

        Ok(Self {
            prices: YahooChartClient::new(client.clone(), &config.yahoo_base_url, config.recent_days),
            companies: AlphaVantageClient::new(
                client.clone(),
                &config.alphavantage_base_url,
                config.alphavantage_api_key.clone(),
            ),
            etfs: MarketWatchClient::new(client, &config.marketwatch_base_url),
        })
    }
}

#[async_trait]
impl MarketDataSource for HttpMarketDataSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_price_series(
        &self,
        ticker: &Ticker,
        mode: FetchMode,
    ) -> Result<Option<Vec<PricePoint>>, SourceError> {
        self.prices.fetch_daily(ticker, mode).await
    }

    async fn is_company(&self, ticker: &Ticker) -> Result<bool, SourceError> {
        self.companies.is_company(ticker).await
    }

    async fn is_etf(&self, ticker: &Ticker) -> Result<bool, SourceError> {
        self.etfs.is_etf(ticker).await
    }

    async fn fetch_company_profile(
        &self,
        ticker: &Ticker,
    ) -> Result<Option<CompanyProfile>, SourceError> {
        self.companies.fetch_profile(ticker).await
    }

    async fn fetch_etf_profile(&self, ticker: &Ticker) -> Result<Option<EtfOverview>, SourceError> {
        self.etfs.fetch_overview(ticker).await
    }
}
