//! Yahoo Finance chart API 클라이언트.
//!
//! `/v8/finance/chart/{symbol}` 응답에서 일별 OHLCV와 수정 종가를 추출합니다.
//! 필드가 하나라도 비어 있는 날짜는 경고 후 건너뜁니다.

use super::http::trim_base;
use crate::error::SourceError;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stockfetch_core::{price_from_f64, FetchMode, PricePoint, Ticker};
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo 일별 가격 클라이언트.
#[derive(Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
    recent_days: i64,
}

impl YahooChartClient {
    pub fn new(client: Client, base_url: &str, recent_days: i64) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            recent_days,
        }
    }

    /// 수집 모드에 맞는 (period1, period2) 초 단위 구간.
    ///
    /// 최근 구간은 최소 1일이며, 표현할 수 없을 만큼 긴 구간은 전체 이력으로 취급합니다.
    fn period(&self, mode: FetchMode, now: DateTime<Utc>) -> (i64, i64) {
        let start = match mode {
            FetchMode::Full => 0,
            FetchMode::Recent => TimeDelta::try_days(self.recent_days.max(1))
                .and_then(|window| now.checked_sub_signed(window))
                .map_or(0, |start| start.timestamp().max(0)),
        };
        (start, now.timestamp())
    }

    /// 일별 가격 조회. 알 수 없는 심볼이면 `Ok(None)`.
    #[instrument(skip_all, fields(ticker = %ticker, mode = %mode))]
    pub async fn fetch_daily(
        &self,
        ticker: &Ticker,
        mode: FetchMode,
    ) -> Result<Option<Vec<PricePoint>>, SourceError> {
        let (period1, period2) = self.period(mode, Utc::now());
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        debug!(period1, period2, "Yahoo 가격 요청");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .map_err(SourceError::from_request)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited("Yahoo chart".to_string()))
            }
            s if !s.is_success() => return Err(SourceError::Status { status: s.as_u16() }),
            _ => {}
        }

        let body = response.text().await.map_err(SourceError::from_request)?;
        parse_chart(ticker, &body)
    }
}

/// chart JSON을 가격 행으로 변환합니다.
fn parse_chart(ticker: &Ticker, body: &str) -> Result<Option<Vec<PricePoint>>, SourceError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        debug!(
            code = err.code.as_deref().unwrap_or(""),
            description = err.description.as_deref().unwrap_or(""),
            "Yahoo 데이터 없음"
        );
        return Ok(None);
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };

    let Some(timestamps) = result.timestamp else {
        return Ok(None);
    };

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default()
        .adjclose;

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = trading_date(*ts, offset) else {
            warn!(ticker = %ticker, timestamp = ts, "잘못된 타임스탬프, 건너뜀");
            continue;
        };

        let field = |values: &[Option<f64>]| values.get(i).copied().flatten().and_then(price_from_f64);
        let row = (
            field(quote.open.as_slice()),
            field(quote.high.as_slice()),
            field(quote.low.as_slice()),
            field(quote.close.as_slice()),
            field(adjclose.as_slice()),
            quote.volume.get(i).copied().flatten(),
        );

        match row {
            (Some(open), Some(high), Some(low), Some(close), Some(adjusted_close), Some(volume)) => {
                points.push(PricePoint {
                    ticker: ticker.clone(),
                    date,
                    open,
                    high,
                    low,
                    close,
                    adjusted_close,
                    volume,
                });
            }
            _ => warn!(ticker = %ticker, date = %date, "불완전한 가격 행, 건너뜀"),
        }
    }

    Ok(Some(points))
}

/// 거래소 현지 시각 기준 거래일.
fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}
