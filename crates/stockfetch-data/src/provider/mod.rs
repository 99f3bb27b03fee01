//! 외부 시장 데이터 소스.
//!
//! `MarketDataSource`는 외부 소스에서 정규화된 가격/메타데이터를 가져오는 인터페이스입니다.
//! 소스가 데이터를 모르는 경우는 `Ok(None)`, 네트워크/rate limit 같은 실패는 `Err`로 구분합니다.
//!
//! ## HTTP 구현
//! - `YahooChartClient`: 일별 가격 (chart API)
//! - `AlphaVantageClient`: 기업 개요 (OVERVIEW)
//! - `MarketWatchClient`: ETF 이름과 보유 종목 (HTML)
//! - `HttpMarketDataSource`: 위 세 클라이언트 통합

pub mod alphavantage;
pub mod composite;
pub mod http;
pub mod marketwatch;
pub mod yahoo;

pub use alphavantage::AlphaVantageClient;
pub use composite::HttpMarketDataSource;
pub use http::{build_http_client, SourceConfig};
pub use marketwatch::MarketWatchClient;
pub use yahoo::YahooChartClient;

use crate::error::SourceError;
use async_trait::async_trait;
use stockfetch_core::{
    Classification, CompanyProfile, EtfOverview, FetchMode, PricePoint, Ticker,
};
use tracing::warn;

/// 시장 데이터 소스 trait.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 소스 이름 (로그용)
    fn name(&self) -> &str;

    /// 일별 가격 시계열. 알 수 없는 심볼이면 `Ok(None)`.
    async fn fetch_price_series(
        &self,
        ticker: &Ticker,
        mode: FetchMode,
    ) -> Result<Option<Vec<PricePoint>>, SourceError>;

    async fn is_company(&self, ticker: &Ticker) -> Result<bool, SourceError>;

    async fn is_etf(&self, ticker: &Ticker) -> Result<bool, SourceError>;

    /// 기업 개요. 기업이 아니면 `Ok(None)`.
    async fn fetch_company_profile(
        &self,
        ticker: &Ticker,
    ) -> Result<Option<CompanyProfile>, SourceError>;

    /// ETF 개요와 보유 종목. ETF가 아니면 `Ok(None)`.
    async fn fetch_etf_profile(&self, ticker: &Ticker) -> Result<Option<EtfOverview>, SourceError>;

    /// 심볼을 분류합니다.
    ///
    /// 지수 심볼(`^`)은 요청 없이 `Unsupported`입니다. 기업 판정을 먼저 하고,
    /// 아니면 ETF 판정을 합니다. 일시적 요청 실패는 `Failed`로 돌려주고,
    /// 재시도로 회복되지 않는 판정 오류는 해당 종류가 아닌 것으로 봅니다.
    async fn classify(&self, ticker: &Ticker) -> Classification {
        if ticker.is_index() {
            return Classification::Unsupported;
        }

        match self.is_company(ticker).await {
            Ok(true) => return Classification::Company,
            Ok(false) => {}
            Err(e) if e.is_transient() => return Classification::Failed(e.to_string()),
            Err(e) => warn!(ticker = %ticker, error = %e, "기업 판정 오류, 기업 아님으로 처리"),
        }

        match self.is_etf(ticker).await {
            Ok(true) => Classification::Etf,
            Ok(false) => Classification::Unsupported,
            Err(e) if e.is_transient() => Classification::Failed(e.to_string()),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "ETF 판정 오류, ETF 아님으로 처리");
                Classification::Unsupported
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 판정 실패 종류
    #[derive(Clone, Copy)]
    enum Fail {
        Transient,
        Terminal,
    }

    impl Fail {
        fn error(self) -> SourceError {
            match self {
                Fail::Transient => SourceError::Timeout("connect".to_string()),
                Fail::Terminal => SourceError::Parse("unexpected body".to_string()),
            }
        }
    }

    /// 판정 결과를 고정하고 호출 횟수를 세는 소스
    struct ProbeSource {
        company: Result<bool, Fail>,
        etf: Result<bool, Fail>,
        calls: AtomicUsize,
    }

    impl ProbeSource {
        fn new(company: Result<bool, Fail>, etf: Result<bool, Fail>) -> Self {
            Self {
                company,
                etf,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for ProbeSource {
        fn name(&self) -> &str {
            "probe"
        }

        async fn fetch_price_series(
            &self,
            _ticker: &Ticker,
            _mode: FetchMode,
        ) -> Result<Option<Vec<PricePoint>>, SourceError> {
            Ok(None)
        }

        async fn is_company(&self, _ticker: &Ticker) -> Result<bool, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.company.map_err(Fail::error)
        }

        async fn is_etf(&self, _ticker: &Ticker) -> Result<bool, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.etf.map_err(Fail::error)
        }

        async fn fetch_company_profile(
            &self,
            _ticker: &Ticker,
        ) -> Result<Option<CompanyProfile>, SourceError> {
            Ok(None)
        }

        async fn fetch_etf_profile(
            &self,
            _ticker: &Ticker,
        ) -> Result<Option<EtfOverview>, SourceError> {
            Ok(None)
        }
    }

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_classify_index_never_probes() {
        let source = ProbeSource::new(Ok(true), Ok(true));
        assert_eq!(source.classify(&ticker("^GSPC")).await, Classification::Unsupported);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classify_company_first() {
        let source = ProbeSource::new(Ok(true), Ok(true));
        assert_eq!(source.classify(&ticker("CRSR")).await, Classification::Company);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_etf_and_unsupported() {
        let etf = ProbeSource::new(Ok(false), Ok(true));
        assert_eq!(etf.classify(&ticker("VOO")).await, Classification::Etf);

        let neither = ProbeSource::new(Ok(false), Ok(false));
        assert_eq!(neither.classify(&ticker("XYZ")).await, Classification::Unsupported);
    }

    #[tokio::test]
    async fn test_classify_failure_is_distinct_from_false() {
        let source = ProbeSource::new(Err(Fail::Transient), Ok(true));
        assert!(matches!(
            source.classify(&ticker("CRSR")).await,
            Classification::Failed(_)
        ));

        let source = ProbeSource::new(Ok(false), Err(Fail::Transient));
        assert!(matches!(
            source.classify(&ticker("VOO")).await,
            Classification::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_classify_terminal_error_is_negative_answer() {
        let source = ProbeSource::new(Err(Fail::Terminal), Ok(true));
        assert_eq!(source.classify(&ticker("VOO")).await, Classification::Etf);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let source = ProbeSource::new(Ok(false), Err(Fail::Terminal));
        assert_eq!(source.classify(&ticker("XYZ")).await, Classification::Unsupported);
    }
}
