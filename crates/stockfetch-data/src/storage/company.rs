//! 기업 개요 저장소.

use super::{Database, SymbolRegistry};
use crate::error::{DataError, Result};
use sqlx::FromRow;
use stockfetch_core::{CompanyProfile, Ticker};
use tracing::{debug, instrument};

#[derive(Debug, Clone, FromRow)]
struct CompanyRecord {
    name: String,
    description: String,
    pe_ratio: f64,
    shares_outstanding: i64,
    shares_float: i64,
    shares_short: i64,
}

/// 기업 개요 repository.
#[derive(Clone)]
pub struct CompanyRepository {
    db: Database,
    registry: SymbolRegistry,
}

impl CompanyRepository {
    pub fn new(db: Database, registry: SymbolRegistry) -> Self {
        Self { db, registry }
    }

    /// 심볼당 하나의 기업 개요를 저장하거나 전체 필드를 덮어씁니다.
    ///
    /// 심볼 행이 먼저 존재해야 합니다 (가격 저장 시 생성됨).
    #[instrument(skip_all, fields(ticker = %profile.ticker))]
    pub async fn upsert(&self, profile: &CompanyProfile) -> Result<()> {
        let symbol_id = self
            .registry
            .resolve(&profile.ticker)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("심볼 {}", profile.ticker)))?;

        sqlx::query(
            r#"
            INSERT INTO companies (symbol_id, name, description, pe_ratio, shares_outstanding, shares_float, shares_short)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (symbol_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                pe_ratio = EXCLUDED.pe_ratio,
                shares_outstanding = EXCLUDED.shares_outstanding,
                shares_float = EXCLUDED.shares_float,
                shares_short = EXCLUDED.shares_short,
                updated_at = NOW()
            "#,
        )
        .bind(symbol_id)
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(profile.pe_ratio)
        .bind(profile.shares_outstanding)
        .bind(profile.shares_float)
        .bind(profile.shares_short)
        .execute(self.db.pool())
        .await?;

        debug!(name = %profile.name, "기업 개요 저장");
        Ok(())
    }

    pub async fn exists(&self, ticker: &Ticker) -> Result<bool> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(false);
        };

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM companies WHERE symbol_id = $1)")
                .bind(symbol_id)
                .fetch_one(self.db.pool())
                .await?;

        Ok(exists)
    }

    pub async fn get(&self, ticker: &Ticker) -> Result<Option<CompanyProfile>> {
        let Some(symbol_id) = self.registry.resolve(ticker).await? else {
            return Ok(None);
        };

        let record: Option<CompanyRecord> = sqlx::query_as(
            r#"
            SELECT name, description, pe_ratio, shares_outstanding, shares_float, shares_short
            FROM companies WHERE symbol_id = $1
            "#,
        )
        .bind(symbol_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record.map(|r| CompanyProfile {
            ticker: ticker.clone(),
            name: r.name,
            description: r.description,
            pe_ratio: r.pe_ratio,
            shares_outstanding: r.shares_outstanding,
            shares_float: r.shares_float,
            shares_short: r.shares_short,
        }))
    }

    /// 기업 개요가 저장된 티커 목록 (알파벳순).
    pub async fn list_tickers(&self) -> Result<Vec<Ticker>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT s.ticker FROM companies c
            JOIN symbols s ON s.id = c.symbol_id
            ORDER BY s.ticker
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|(t,)| Ticker::parse(&t).map_err(DataError::from))
            .collect()
    }
}
