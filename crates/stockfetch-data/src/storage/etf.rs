//! ETF 개요 및 보유 종목 저장소.

use super::{Database, SymbolRegistry};
use crate::error::{DataError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockfetch_core::{
    DecimalExt, EtfProfile, Holding, Holdings, SymbolId, Ticker, ValidationError,
};
use tracing::{debug, instrument, warn};

/// `NUMERIC(6,2)` 비중 상한 (절대값)
const MAX_PERCENT: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// 보유 종목 갱신 정책.
///
/// `Append`는 이번 수집에 없는 기존 보유 종목을 그대로 둡니다.
/// `Prune`은 같은 트랜잭션에서 이번 수집에 없는 종목을 삭제합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingsPolicy {
    #[default]
    Append,
    Prune,
}

impl std::str::FromStr for HoldingsPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "prune" => Ok(Self::Prune),
            _ => Err(ValidationError::UnknownVariant {
                field: "holdings_policy",
                value: s.to_string(),
            }),
        }
    }
}

/// ETF repository.
#[derive(Clone)]
pub struct EtfRepository {
    db: Database,
    registry: SymbolRegistry,
}

impl EtfRepository {
    pub fn new(db: Database, registry: SymbolRegistry) -> Self {
        Self { db, registry }
    }

    /// ETF 개요를 저장하거나 덮어씁니다.
    #[instrument(skip_all, fields(ticker = %profile.ticker))]
    pub async fn upsert_profile(&self, profile: &EtfProfile) -> Result<()> {
        let symbol_id = self.require_symbol(&profile.ticker).await?;

        sqlx::query(
            r#"
            INSERT INTO etfs (symbol_id, name)
            VALUES ($1, $2)
            ON CONFLICT (symbol_id) DO UPDATE SET
                name = EXCLUDED.name,
                updated_at = NOW()
            "#,
        )
        .bind(symbol_id)
        .bind(&profile.name)
        .execute(self.db.pool())
        .await?;

        debug!(name = %profile.name, "ETF 개요 저장");
        Ok(())
    }

    pub async fn exists(&self, ticker: &Ticker) -> Result<bool> {
        Ok(self.etf_id(ticker).await?.is_some())
    }

    pub async fn get_profile(&self, ticker: &Ticker) -> Result<Option<EtfProfile>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(None);
        };

        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM etfs WHERE symbol_id = $1")
            .bind(symbol_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|(name,)| EtfProfile::new(ticker.clone(), name)))
    }

    /// 보유 종목을 기록합니다.
    ///
    /// ETF 개요 행이 먼저 있어야 합니다. 처음 보는 보유 종목은 심볼 행을 새로 만듭니다.
    /// 반환값은 기록된 보유 종목 수입니다.
    #[instrument(skip_all, fields(etf = %etf, count = holdings.len(), policy = ?policy))]
    pub async fn replace_holdings(
        &self,
        etf: &Ticker,
        holdings: &Holdings,
        policy: HoldingsPolicy,
    ) -> Result<usize> {
        let etf_id = self
            .etf_id(etf)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("ETF {}", etf)))?;

        let valid: Vec<(&Ticker, Decimal)> = holdings
            .iter()
            .filter_map(|(ticker, percent)| {
                let percent = percent.round_percent();
                if percent.abs() > MAX_PERCENT {
                    warn!(etf = %etf, held = %ticker, percent = %percent, "비중 범위 초과, 제외");
                    None
                } else {
                    Some((ticker, percent))
                }
            })
            .collect();

        let tickers: Vec<&Ticker> = valid.iter().map(|(t, _)| *t).collect();
        let ids = self.registry.ensure_all(&tickers).await?;

        let mut tx = self.db.pool().begin().await?;

        if policy == HoldingsPolicy::Prune {
            let keep: Vec<i64> = ids.values().map(|id| id.get()).collect();
            let removed = sqlx::query(
                "DELETE FROM etf_holdings WHERE etf_id = $1 AND NOT (held_symbol_id = ANY($2))",
            )
            .bind(etf_id)
            .bind(keep)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if removed > 0 {
                debug!(removed = removed, "기존 보유 종목 정리");
            }
        }

        if !valid.is_empty() {
            let mut sql = String::from(
                "INSERT INTO etf_holdings (etf_id, held_symbol_id, percent) VALUES ",
            );
            for i in 0..valid.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&format!("($1, ${}, ${})", i * 2 + 2, i * 2 + 3));
            }
            sql.push_str(" ON CONFLICT (etf_id, held_symbol_id) DO UPDATE SET percent = EXCLUDED.percent");

            let mut query = sqlx::query(&sql).bind(etf_id);
            for (ticker, percent) in &valid {
                let held_id: SymbolId = ids
                    .get(*ticker)
                    .copied()
                    .ok_or_else(|| DataError::NotFound(format!("심볼 {}", ticker)))?;
                query = query.bind(held_id).bind(*percent);
            }

            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;

        debug!(written = valid.len(), "보유 종목 저장 완료");
        Ok(valid.len())
    }

    /// 보유 종목 (비중 내림차순, 같은 비중은 티커순).
    pub async fn get_holdings(&self, etf: &Ticker) -> Result<Vec<Holding>> {
        let Some(etf_id) = self.etf_id(etf).await? else {
            return Ok(Vec::new());
        };

        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            r#"
            SELECT s.ticker, h.percent FROM etf_holdings h
            JOIN symbols s ON s.id = h.held_symbol_id
            WHERE h.etf_id = $1
            ORDER BY h.percent DESC, s.ticker ASC
            "#,
        )
        .bind(etf_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|(ticker, percent)| -> Result<Holding> {
                Ok(Holding {
                    ticker: Ticker::parse(&ticker)?,
                    percent,
                })
            })
            .collect()
    }

    /// ETF 개요가 저장된 티커 목록 (알파벳순).
    pub async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT s.ticker FROM etfs e
            JOIN symbols s ON s.id = e.symbol_id
            ORDER BY s.ticker
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|(t,)| Ticker::parse(&t).map_err(DataError::from))
            .collect()
    }

    async fn require_symbol(&self, ticker: &Ticker) -> Result<SymbolId> {
        self.registry
            .resolve(ticker)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("심볼 {}", ticker)))
    }

    async fn etf_id(&self, ticker: &Ticker) -> Result<Option<i64>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(None);
        };

        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM etfs WHERE symbol_id = $1")
            .bind(symbol_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|(id,)| id))
    }
}
