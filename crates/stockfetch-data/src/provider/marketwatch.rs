//! MarketWatch ETF 보유 종목 페이지 스크래퍼.
//!
//! `/investing/fund/{symbol}/holdings` 페이지에서 펀드 이름과 상위 보유 종목을 읽습니다.
//! ETF가 아닌 심볼은 다른 페이지로 리다이렉트되므로 최종 경로로 판정합니다.

use super::http::trim_base;
use crate::error::SourceError;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use stockfetch_core::{DecimalExt, EtfOverview, EtfProfile, Holdings, Ticker};
use tracing::{debug, instrument, warn};

const NAME_SELECTOR: &str = ".company__name";
const HOLDING_ROW_SELECTOR: &str = ".element--table.holdings tbody .table__row";

/// MarketWatch ETF 클라이언트.
#[derive(Clone)]
pub struct MarketWatchClient {
    client: Client,
    base_url: String,
}

impl MarketWatchClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn holdings_path(ticker: &Ticker) -> String {
        format!("/investing/fund/{}/holdings", ticker.as_str().to_lowercase())
    }

    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn is_etf(&self, ticker: &Ticker) -> Result<bool, SourceError> {
        Ok(self.holdings_page(ticker).await?.is_some())
    }

    /// ETF 개요 조회. ETF가 아니면 `Ok(None)`.
    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn fetch_overview(&self, ticker: &Ticker) -> Result<Option<EtfOverview>, SourceError> {
        match self.holdings_page(ticker).await? {
            Some(html) => parse_holdings_page(ticker, &html).map(Some),
            None => Ok(None),
        }
    }

    /// 보유 종목 페이지 HTML. 리다이렉트되거나 404면 `None`.
    async fn holdings_page(&self, ticker: &Ticker) -> Result<Option<String>, SourceError> {
        let path = Self::holdings_path(ticker);
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SourceError::from_request)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited("MarketWatch".to_string()))
            }
            s if !s.is_success() => return Err(SourceError::Status { status: s.as_u16() }),
            _ => {}
        }

        let final_path = response.url().path().trim_end_matches('/').to_lowercase();
        if final_path != path {
            debug!(redirected_to = %final_path, "ETF 페이지 아님");
            return Ok(None);
        }

        let html = response.text().await.map_err(SourceError::from_request)?;
        Ok(Some(html))
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector {}: {}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// 보유 종목 페이지를 ETF 개요로 변환합니다.
///
/// `Html`은 `Send`가 아니므로 동기 함수에서만 다룹니다.
fn parse_holdings_page(ticker: &Ticker, html: &str) -> Result<EtfOverview, SourceError> {
    let document = Html::parse_document(html);

    let name = document
        .select(&selector(NAME_SELECTOR)?)
        .next()
        .map(cell_text)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SourceError::Parse(format!("{} ETF 이름 없음", ticker)))?;

    let td = selector("td")?;
    let mut holdings = Holdings::new();

    for row in document.select(&selector(HOLDING_ROW_SELECTOR)?) {
        let cells: Vec<String> = row.select(&td).map(cell_text).collect();
        let [_, symbol, percent, ..] = cells.as_slice() else {
            warn!(etf = %ticker, "보유 종목 행 형식 오류, 건너뜀");
            continue;
        };

        let held = match Ticker::parse(symbol) {
            Ok(t) => t,
            Err(e) => {
                warn!(etf = %ticker, symbol = %symbol, error = %e, "보유 종목 심볼 오류, 건너뜀");
                continue;
            }
        };

        match Decimal::from_str(percent.trim_end_matches('%').trim()) {
            Ok(p) => {
                holdings.insert(held, p.round_percent());
            }
            Err(e) => {
                warn!(etf = %ticker, symbol = %symbol, percent = %percent, error = %e, "보유 비중 파싱 실패, 건너뜀");
            }
        }
    }

    debug!(etf = %ticker, count = holdings.len(), "보유 종목 파싱 완료");

    Ok(EtfOverview {
        profile: EtfProfile::new(ticker.clone(), name),
        holdings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HOLDINGS_PAGE: &str = r#"
        <html><body>
          <h1 class="company__name">Vanguard S&amp;P 500 ETF</h1>
          <div class="element element--table holdings">
            <table>
              <thead><tr><th>Company</th><th>Symbol</th><th>% of Assets</th></tr></thead>
              <tbody>
                <tr class="table__row"><td>Apple Inc.</td><td>AAPL</td><td>7.10%</td></tr>
                <tr class="table__row"><td>NewCo</td><td>NEWCO</td><td>0.3%</td></tr>
                <tr class="table__row"><td>Cash</td><td></td><td>0.05%</td></tr>
                <tr class="table__row"><td>Broken</td></tr>
              </tbody>
            </table>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_holdings_page() {
        let voo = Ticker::parse("VOO").unwrap();
        let overview = parse_holdings_page(&voo, HOLDINGS_PAGE).unwrap();

        assert_eq!(overview.profile.name, "Vanguard S&P 500 ETF");
        assert_eq!(overview.holdings.len(), 2);
        assert_eq!(overview.holdings[&Ticker::parse("AAPL").unwrap()], dec!(7.10));
        assert_eq!(overview.holdings[&Ticker::parse("NEWCO").unwrap()], dec!(0.3));
    }

    #[test]
    fn test_parse_page_without_name_fails() {
        let voo = Ticker::parse("VOO").unwrap();
        assert!(matches!(
            parse_holdings_page(&voo, "<html><body></body></html>"),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_holdings_path_is_lowercase() {
        let voo = Ticker::parse("VOO").unwrap();
        assert_eq!(MarketWatchClient::holdings_path(&voo), "/investing/fund/voo/holdings");
    }
}
