//! Alpha Vantage OVERVIEW 클라이언트.
//!
//! - 빈 객체 `{}`: 기업이 아님 (없는 심볼)
//! - `Note` / `Information` 키, 또는 Name/Description 없는 응답: 호출 한도 초과
//! - `"None"`, `"-"`, 누락된 수치: -1 (미보고)

use super::http::trim_base;
use crate::error::SourceError;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::sync::Arc;
use stockfetch_core::{CompanyProfile, Ticker};
use tracing::{debug, instrument};

type Overview = Map<String, Value>;

/// Alpha Vantage 기업 개요 클라이언트.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: Arc<SecretString>,
}

impl AlphaVantageClient {
    pub fn new(client: Client, base_url: &str, api_key: Arc<SecretString>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            api_key,
        }
    }

    /// OVERVIEW 응답이 비어 있지 않으면 기업으로 판정합니다.
    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn is_company(&self, ticker: &Ticker) -> Result<bool, SourceError> {
        let overview = self.overview(ticker).await?;
        Ok(!overview.is_empty())
    }

    /// 기업 개요 조회. 기업이 아니면 `Ok(None)`.
    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn fetch_profile(&self, ticker: &Ticker) -> Result<Option<CompanyProfile>, SourceError> {
        let overview = self.overview(ticker).await?;
        if overview.is_empty() {
            debug!("기업 개요 없음");
            return Ok(None);
        }
        parse_overview(ticker, &overview).map(Some)
    }

    async fn overview(&self, ticker: &Ticker) -> Result<Overview, SourceError> {
        let url = format!("{}/query", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", ticker.as_str()),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(SourceError::from_request)?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited("Alpha Vantage".to_string()))
            }
            s if !s.is_success() => return Err(SourceError::Status { status: s.as_u16() }),
            _ => {}
        }

        let overview: Overview = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        if let Some(note) = overview.get("Note").or_else(|| overview.get("Information")) {
            return Err(SourceError::RateLimited(
                note.as_str().unwrap_or("API 호출 한도 초과").to_string(),
            ));
        }

        Ok(overview)
    }
}

/// OVERVIEW 객체를 기업 개요로 변환합니다.
fn parse_overview(ticker: &Ticker, overview: &Overview) -> Result<CompanyProfile, SourceError> {
    let text = |key: &str| overview.get(key).and_then(Value::as_str).map(str::to_string);

    let (Some(name), Some(description)) = (text("Name"), text("Description")) else {
        return Err(SourceError::RateLimited(format!(
            "{} 기업 개요에 Name/Description 없음",
            ticker
        )));
    };

    let mut profile = CompanyProfile::new(ticker.clone(), name, description);
    if let Some(pe) = number_f64(overview.get("PERatio")) {
        profile.pe_ratio = pe;
    }
    if let Some(v) = number_i64(overview.get("SharesOutstanding")) {
        profile.shares_outstanding = v;
    }
    if let Some(v) = number_i64(overview.get("SharesFloat")) {
        profile.shares_float = v;
    }
    if let Some(v) = number_i64(overview.get("SharesShort")) {
        profile.shares_short = v;
    }

    Ok(profile)
}

fn number_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn number_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview(value: Value) -> Overview {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_overview_fills_sentinels() {
        let ticker = Ticker::parse("CRSR").unwrap();
        let data = overview(json!({
            "Symbol": "CRSR",
            "Name": "Corsair Gaming Inc",
            "Description": "Gaming peripherals",
            "PERatio": "None",
            "SharesOutstanding": "104000000",
            "SharesFloat": "-",
        }));

        let profile = parse_overview(&ticker, &data).unwrap();
        assert_eq!(profile.name, "Corsair Gaming Inc");
        assert_eq!(profile.pe_ratio, -1.0);
        assert_eq!(profile.shares_outstanding, 104_000_000);
        assert_eq!(profile.shares_float, CompanyProfile::UNKNOWN);
        assert_eq!(profile.shares_short, CompanyProfile::UNKNOWN);
    }

    #[test]
    fn test_parse_overview_keeps_zero() {
        let ticker = Ticker::parse("ZERO").unwrap();
        let data = overview(json!({
            "Name": "Zero Co",
            "Description": "",
            "PERatio": "0",
            "SharesShort": 0,
        }));

        let profile = parse_overview(&ticker, &data).unwrap();
        assert_eq!(profile.pe_ratio(), Some(0.0));
        assert_eq!(profile.shares_short(), Some(0));
    }

    #[test]
    fn test_parse_overview_requires_name() {
        let ticker = Ticker::parse("AAPL").unwrap();
        let data = overview(json!({"Symbol": "AAPL"}));
        assert!(matches!(
            parse_overview(&ticker, &data),
            Err(SourceError::RateLimited(_))
        ));
    }
}
