//! 도메인 타입 통합 테스트

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use stockfetch_core::{
    Classification, CompanyProfile, EtfOverview, EtfProfile, FetchMode, Holdings, PricePoint,
    SymbolKind, Ticker, ValidationError,
};

fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).unwrap()
}

#[test]
fn test_price_point_json_shape() {
    let point = PricePoint {
        ticker: ticker("voo"),
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        open: dec!(436.11),
        high: dec!(437.5),
        low: dec!(433.9),
        close: dec!(435.2),
        adjusted_close: dec!(429.8841),
        volume: 4_210_300,
    };

    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(json["ticker"], "VOO");
    assert_eq!(json["date"], "2024-01-02");
    assert_eq!(json["volume"], 4_210_300);

    let back: PricePoint = serde_json::from_value(json).unwrap();
    assert_eq!(back, point);
}

#[test]
fn test_malformed_price_error_names_row() {
    let point = PricePoint {
        ticker: ticker("CRSR"),
        date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        open: dec!(10),
        high: dec!(9),
        low: dec!(11),
        close: dec!(10),
        adjusted_close: dec!(10),
        volume: 1,
    };

    match point.validate() {
        Err(ValidationError::MalformedPrice { ticker, date, .. }) => {
            assert_eq!(ticker, "CRSR");
            assert_eq!(date, "2024-05-06");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_etf_overview_holdings_sorted_by_ticker() {
    let mut holdings = Holdings::new();
    holdings.insert(ticker("newco"), dec!(0.3));
    holdings.insert(ticker("AAPL"), dec!(7.1));

    let overview = EtfOverview {
        profile: EtfProfile::new(ticker("VOO"), "Vanguard S&P 500 ETF"),
        holdings,
    };

    let keys: Vec<&str> = overview.holdings.keys().map(Ticker::as_str).collect();
    assert_eq!(keys, vec!["AAPL", "NEWCO"]);
}

#[test]
fn test_classification_failure_is_not_unsupported() {
    assert_ne!(Classification::Failed("timeout".into()), Classification::Unsupported);
    assert_eq!(SymbolKind::Company.to_string(), "company");
    assert_eq!(serde_json::to_string(&SymbolKind::Etf).unwrap(), "\"etf\"");
}

#[test]
fn test_company_profile_zero_is_not_unknown() {
    let mut profile = CompanyProfile::new(ticker("ZERO"), "Zero Corp", "");
    profile.pe_ratio = 0.0;
    assert_eq!(profile.pe_ratio(), Some(0.0));
    assert_eq!(profile.shares_float, CompanyProfile::UNKNOWN);
    assert_eq!(FetchMode::default(), FetchMode::Recent);
}
