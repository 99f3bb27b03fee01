//! HTTP 소스 어댑터 테스트 (mockito 서버).

use mockito::{Matcher, Server};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::time::Duration;
use stockfetch_core::{Classification, FetchMode, Ticker};
use stockfetch_data::{HttpMarketDataSource, MarketDataSource, SourceConfig, SourceError};

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).unwrap()
}

fn source_for(server: &Server) -> HttpMarketDataSource {
    let mut config = SourceConfig::new(SecretString::new("test-key".into()));
    config.yahoo_base_url = server.url();
    config.alphavantage_base_url = server.url();
    config.marketwatch_base_url = server.url();
    config.read_timeout = Duration::from_secs(5);
    HttpMarketDataSource::new(&config).unwrap()
}

const CHART_BODY: &str = r#"{
    "chart": {
        "result": [{
            "meta": {"gmtoffset": -18000},
            "timestamp": [1704205800, 1704292200],
            "indicators": {
                "quote": [{
                    "open": [187.15, 184.22],
                    "high": [188.44, 185.88],
                    "low": [183.89, 183.43],
                    "close": [185.64, 184.25],
                    "volume": [82488700, 58414500]
                }],
                "adjclose": [{"adjclose": [184.73, 183.35]}]
            }
        }],
        "error": null
    }
}"#;

#[tokio::test]
async fn test_yahoo_price_series() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::UrlEncoded("interval".into(), "1d".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CHART_BODY)
        .create_async()
        .await;

    let source = source_for(&server);
    let points = source
        .fetch_price_series(&ticker("AAPL"), FetchMode::Full)
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].close, dec!(185.64));
    assert_eq!(points[0].adjusted_close, dec!(184.73));
    assert_eq!(points[1].volume, 58_414_500);
}

#[tokio::test]
async fn test_yahoo_unknown_symbol_is_absent() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/BADSYM")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#)
        .create_async()
        .await;

    let source = source_for(&server);
    let result = source
        .fetch_price_series(&ticker("BADSYM"), FetchMode::Recent)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_yahoo_server_error_is_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let source = source_for(&server);
    let err = source
        .fetch_price_series(&ticker("AAPL"), FetchMode::Recent)
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_alphavantage_company_profile() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("function".into(), "OVERVIEW".into()),
            Matcher::UrlEncoded("symbol".into(), "CRSR".into()),
            Matcher::UrlEncoded("apikey".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"Symbol":"CRSR","Name":"Corsair Gaming Inc","Description":"Peripherals","PERatio":"None","SharesOutstanding":"104000000"}"#,
        )
        .expect(2)
        .create_async()
        .await;

    let source = source_for(&server);
    assert!(source.is_company(&ticker("CRSR")).await.unwrap());

    let profile = source
        .fetch_company_profile(&ticker("CRSR"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.name, "Corsair Gaming Inc");
    assert_eq!(profile.pe_ratio(), None);
    assert_eq!(profile.shares_outstanding(), Some(104_000_000));
}

#[tokio::test]
async fn test_alphavantage_empty_overview_is_not_company() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let source = source_for(&server);
    assert!(!source.is_company(&ticker("VOO")).await.unwrap());
    assert!(source
        .fetch_company_profile(&ticker("VOO"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_alphavantage_note_is_rate_limit() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Note":"Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#)
        .create_async()
        .await;

    let source = source_for(&server);
    let err = source.is_company(&ticker("CRSR")).await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimited(_)));
    assert!(err.is_transient());

    // 분류 실패는 "기업 아님"과 구분됨
    assert!(matches!(
        source.classify(&ticker("CRSR")).await,
        Classification::Failed(_)
    ));
}

const HOLDINGS_PAGE: &str = r#"
<html><body>
  <h1 class="company__name">Vanguard S&amp;P 500 ETF</h1>
  <div class="element element--table holdings">
    <table><tbody>
      <tr class="table__row"><td>Apple Inc.</td><td>AAPL</td><td>7.10%</td></tr>
      <tr class="table__row"><td>Microsoft Corp.</td><td>MSFT</td><td>6.52%</td></tr>
    </tbody></table>
  </div>
</body></html>
"#;

#[tokio::test]
async fn test_marketwatch_etf_overview() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/investing/fund/voo/holdings")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(HOLDINGS_PAGE)
        .create_async()
        .await;

    let source = source_for(&server);
    let overview = source
        .fetch_etf_profile(&ticker("VOO"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(overview.profile.ticker, ticker("VOO"));
    assert_eq!(overview.profile.name, "Vanguard S&P 500 ETF");
    assert_eq!(overview.holdings.len(), 2);
    assert_eq!(overview.holdings[&ticker("MSFT")], dec!(6.52));
}

#[tokio::test]
async fn test_marketwatch_redirect_is_not_etf() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/investing/fund/crsr/holdings")
        .with_status(302)
        .with_header("location", "/search")
        .create_async()
        .await;
    server
        .mock("GET", "/search")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>Search results</body></html>")
        .create_async()
        .await;

    let source = source_for(&server);
    assert!(!source.is_etf(&ticker("CRSR")).await.unwrap());
    assert!(source
        .fetch_etf_profile(&ticker("CRSR"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_classify_against_http_sources() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("GET", "/investing/fund/voo/holdings")
        .with_status(200)
        .with_body(HOLDINGS_PAGE)
        .create_async()
        .await;

    let source = source_for(&server);
    assert_eq!(source.classify(&ticker("VOO")).await, Classification::Etf);
    assert_eq!(source.classify(&ticker("^GSPC")).await, Classification::Unsupported);
}
