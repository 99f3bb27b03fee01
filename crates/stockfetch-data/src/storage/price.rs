//! 일별 가격 저장소.

use super::{Database, SymbolRegistry};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;
use stockfetch_core::{PricePoint, SymbolId, Ticker};
use tracing::{debug, instrument, warn};

/// 한 번의 INSERT 문에 담는 최대 행 수 (행당 바인드 8개)
const CHUNK_SIZE: usize = 1000;

/// `upsert_series` 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// 저장(삽입 또는 갱신)된 행 수
    pub written: usize,
    /// 검증 실패로 버린 행 수
    pub dropped: usize,
}

/// 가격 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: i64,
}

impl PriceRecord {
    pub fn into_point(self, ticker: Ticker) -> PricePoint {
        PricePoint {
            ticker,
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: self.volume,
        }
    }
}

/// 일별 가격 repository.
#[derive(Clone)]
pub struct PriceRepository {
    db: Database,
    registry: SymbolRegistry,
}

impl PriceRepository {
    pub fn new(db: Database, registry: SymbolRegistry) -> Self {
        Self { db, registry }
    }

    /// 가격 시계열을 멱등적으로 저장합니다.
    ///
    /// - 각 행의 심볼은 없으면 생성합니다.
    /// - 검증에 실패한 행은 경고 로그와 함께 버리고 나머지는 저장합니다.
    /// - 같은 (심볼, 날짜)가 입력에 여러 번 있으면 마지막 값만 남깁니다.
    /// - 전체 쓰기는 하나의 트랜잭션이며, 실패 시 아무것도 반영되지 않습니다.
    #[instrument(skip_all, fields(ticker = %ticker, count = points.len()))]
    pub async fn upsert_series(&self, ticker: &Ticker, points: &[PricePoint]) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        let mut rows: BTreeMap<(&Ticker, NaiveDate), &PricePoint> = BTreeMap::new();

        for point in points {
            match point.validate() {
                Ok(()) => {
                    rows.insert((&point.ticker, point.date), point);
                }
                Err(e) => {
                    warn!(ticker = %point.ticker, date = %point.date, error = %e, "잘못된 가격 행 제외");
                    report.dropped += 1;
                }
            }
        }

        if rows.is_empty() {
            return Ok(report);
        }

        let tickers: Vec<&Ticker> = rows.keys().map(|(t, _)| *t).collect();
        let ids = self.registry.ensure_all(&tickers).await?;
        let rows: Vec<(SymbolId, &PricePoint)> = rows
            .into_values()
            .filter_map(|p| ids.get(&p.ticker).map(|id| (*id, p)))
            .collect();

        let mut tx = self.db.pool().begin().await?;

        for chunk in rows.chunks(CHUNK_SIZE) {
            let mut sql = String::from(
                r#"
                INSERT INTO prices (symbol_id, date, open, high, low, close, adjusted_close, volume)
                VALUES
                "#,
            );

            for i in 0..chunk.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let base = i * 8;
                sql.push_str(&format!(
                    "(${}, ${}, ${}, ${}, ${}, ${}, ${}, ${})",
                    base + 1,
                    base + 2,
                    base + 3,
                    base + 4,
                    base + 5,
                    base + 6,
                    base + 7,
                    base + 8
                ));
            }

            sql.push_str(
                r#"
                ON CONFLICT (symbol_id, date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    adjusted_close = EXCLUDED.adjusted_close,
                    volume = EXCLUDED.volume
                "#,
            );

            let mut query = sqlx::query(&sql);
            for (symbol_id, p) in chunk {
                query = query
                    .bind(*symbol_id)
                    .bind(p.date)
                    .bind(p.open)
                    .bind(p.high)
                    .bind(p.low)
                    .bind(p.close)
                    .bind(p.adjusted_close)
                    .bind(p.volume);
            }

            let result = query.execute(&mut *tx).await?;
            report.written += result.rows_affected() as usize;
        }

        tx.commit().await?;

        debug!(written = report.written, dropped = report.dropped, "가격 저장 완료");
        Ok(report)
    }

    /// 전체 가격 이력 (날짜 오름차순).
    pub async fn get_history(&self, ticker: &Ticker) -> Result<Vec<PricePoint>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(Vec::new());
        };

        let records: Vec<PriceRecord> = sqlx::query_as(
            r#"
            SELECT date, open, high, low, close, adjusted_close, volume FROM prices
            WHERE symbol_id = $1
            ORDER BY date ASC
            "#,
        )
        .bind(symbol_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records.into_iter().map(|r| r.into_point(ticker.clone())).collect())
    }

    /// 날짜 구간 [from, to] 가격 이력.
    pub async fn get_range(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(Vec::new());
        };

        let records: Vec<PriceRecord> = sqlx::query_as(
            r#"
            SELECT date, open, high, low, close, adjusted_close, volume FROM prices
            WHERE symbol_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(symbol_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records.into_iter().map(|r| r.into_point(ticker.clone())).collect())
    }

    pub async fn has_data(&self, ticker: &Ticker) -> Result<bool> {
        Ok(self.latest_date(ticker).await?.is_some())
    }

    /// 저장된 가장 최근 거래일.
    pub async fn latest_date(&self, ticker: &Ticker) -> Result<Option<NaiveDate>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(None);
        };

        let row: (Option<NaiveDate>,) =
            sqlx::query_as("SELECT MAX(date) FROM prices WHERE symbol_id = $1")
                .bind(symbol_id)
                .fetch_one(self.db.pool())
                .await?;

        Ok(row.0)
    }
}
