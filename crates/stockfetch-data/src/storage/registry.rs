//! 심볼 레지스트리.
//!
//! 티커 → 숫자 식별자 매핑을 관리합니다. 심볼 행은 생성 후 변경/삭제되지 않으므로
//! 캐시는 write-through 방식이며 프로세스 수명 동안 무효화하지 않습니다.

use super::Database;
use crate::error::{DataError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use stockfetch_core::{SymbolId, Ticker};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// 티커 식별자 레지스트리.
///
/// 복제본끼리 같은 캐시를 공유합니다. 프로세스당 하나를 만들어 각 저장소에 넘깁니다.
#[derive(Clone)]
pub struct SymbolRegistry {
    db: Database,
    cache: Arc<RwLock<HashMap<Ticker, SymbolId>>>,
}

impl SymbolRegistry {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 티커의 식별자를 조회합니다. 없으면 `Ok(None)`.
    ///
    /// 캐시를 먼저 확인하고, 미스 시 DB 조회 결과를 캐시에 채웁니다.
    /// DB 오류는 "없음"으로 취급하지 않고 그대로 반환합니다.
    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn resolve(&self, ticker: &Ticker) -> Result<Option<SymbolId>> {
        if let Some(id) = self.cache.read().await.get(ticker) {
            return Ok(Some(*id));
        }

        let found = self.lookup(ticker).await?;
        if let Some(id) = found {
            self.cache.write().await.insert(ticker.clone(), id);
        }
        Ok(found)
    }

    /// 식별자를 조회하거나 새로 생성합니다.
    ///
    /// 같은 티커로 동시에 호출되어도 `symbols.ticker` UNIQUE 제약이 최종 판정을 하며,
    /// 경합에서 진 쪽은 실패하지 않고 다시 조회합니다.
    #[instrument(skip_all, fields(ticker = %ticker))]
    pub async fn ensure(&self, ticker: &Ticker) -> Result<SymbolId> {
        if let Some(id) = self.resolve(ticker).await? {
            return Ok(id);
        }

        let inserted: Option<(SymbolId,)> = sqlx::query_as(
            r#"
            INSERT INTO symbols (ticker)
            VALUES ($1)
            ON CONFLICT (ticker) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(ticker.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        let id = match inserted {
            Some((id,)) => {
                debug!(ticker = %ticker, id = %id, "심볼 생성");
                id
            }
            None => self.lookup(ticker).await?.ok_or_else(|| {
                DataError::NotFound(format!("심볼 {} 생성 경합 후 조회 실패", ticker))
            })?,
        };

        self.cache.write().await.insert(ticker.clone(), id);
        Ok(id)
    }

    pub async fn exists(&self, ticker: &Ticker) -> Result<bool> {
        Ok(self.resolve(ticker).await?.is_some())
    }

    /// 여러 티커를 한 번에 확보합니다 (중복 제거).
    pub async fn ensure_all(&self, tickers: &[&Ticker]) -> Result<HashMap<Ticker, SymbolId>> {
        let mut ids = HashMap::new();
        for &ticker in tickers {
            if !ids.contains_key(ticker) {
                let id = self.ensure(ticker).await?;
                ids.insert(ticker.clone(), id);
            }
        }
        Ok(ids)
    }

    async fn lookup(&self, ticker: &Ticker) -> Result<Option<SymbolId>> {
        let row: Option<(SymbolId,)> = sqlx::query_as("SELECT id FROM symbols WHERE ticker = $1")
            .bind(ticker.as_str())
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|(id,)| id))
    }
}
