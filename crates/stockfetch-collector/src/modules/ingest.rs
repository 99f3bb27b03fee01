//! 심볼 수집 오케스트레이터.
//!
//! 심볼 하나의 수집 순서:
//! 1. 분류 (기업 / ETF / 미지원). `^` 지수 심볼은 요청 없이 거부
//! 2. 가격 시계열 조회 (전체 또는 최근 구간)
//! 3. 가격 저장
//! 4. 메타데이터가 없으면(또는 `MetadataRefresh::Always`) 조회 후 저장
//!
//! 모든 소스/저장소 오류는 `IngestOutcome`으로 변환되며 배치를 중단시키지 않습니다.
//! 재시도로 회복될 수 있는 소스 오류만 `SourceUnavailable`입니다.
//! 같은 심볼을 동시에 두 번 수집하지 않는 것은 호출자 책임입니다.

use super::progress::{BatchPosition, IngestPhase, ProgressEvent, ProgressReporter};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stockfetch_core::{Classification, FetchMode, SymbolKind, Ticker, ValidationError};
use stockfetch_data::{DataError, HoldingsPolicy, MarketDataSource, SourceError, StockRepository};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// 기존 메타데이터 갱신 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataRefresh {
    /// 저장된 개요가 없을 때만 조회
    #[default]
    IfMissing,
    /// 매번 다시 조회해서 덮어씀
    Always,
}

impl std::str::FromStr for MetadataRefresh {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "if-missing" | "if_missing" => Ok(Self::IfMissing),
            "always" => Ok(Self::Always),
            _ => Err(ValidationError::UnknownVariant {
                field: "metadata_refresh",
                value: s.to_string(),
            }),
        }
    }
}

/// 수집 옵션.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// 배치 안에서 심볼 사이 대기 시간
    pub request_delay: Duration,
    pub metadata_refresh: MetadataRefresh,
    pub holdings_policy: HoldingsPolicy,
    /// 동시에 수집할 심볼 수 (1이면 순차)
    pub concurrency: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::ZERO,
            metadata_refresh: MetadataRefresh::IfMissing,
            holdings_policy: HoldingsPolicy::Append,
            concurrency: 1,
        }
    }
}

/// 수집 요청 한 건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub ticker: Ticker,
    pub mode: FetchMode,
}

impl IngestRequest {
    pub fn new(ticker: Ticker, mode: FetchMode) -> Self {
        Self { ticker, mode }
    }
}

/// 심볼별 수집 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// 가격과 메타데이터 저장 완료
    Ok { rows: usize },
    /// 가격은 저장했으나 메타데이터를 가져오지 못함 (경고 수준)
    PartialMetadataMissing { rows: usize, reason: String },
    /// 소스에 데이터가 없는 심볼
    InvalidSymbol,
    /// 기업도 ETF도 아닌 심볼 (지수 포함)
    UnsupportedType,
    /// 네트워크/타임아웃/rate limit. 나중에 다시 시도 가능
    SourceUnavailable { reason: String },
    /// 저장소 연결 실패 또는 쓰기 거부
    PersistenceFailed { reason: String },
    /// 취소되어 처리하지 않음
    Cancelled,
}

/// 필드 없는 결과 종류 (집계/진행 이벤트용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Ok,
    PartialMetadataMissing,
    InvalidSymbol,
    UnsupportedType,
    SourceUnavailable,
    PersistenceFailed,
    Cancelled,
}

impl IngestOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Ok { .. } => OutcomeKind::Ok,
            Self::PartialMetadataMissing { .. } => OutcomeKind::PartialMetadataMissing,
            Self::InvalidSymbol => OutcomeKind::InvalidSymbol,
            Self::UnsupportedType => OutcomeKind::UnsupportedType,
            Self::SourceUnavailable { .. } => OutcomeKind::SourceUnavailable,
            Self::PersistenceFailed { .. } => OutcomeKind::PersistenceFailed,
            Self::Cancelled => OutcomeKind::Cancelled,
        }
    }

    /// 가격 데이터가 저장되었는지 여부.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::PartialMetadataMissing { .. })
    }

    /// 저장된 가격 행 수.
    pub fn rows(&self) -> usize {
        match self {
            Self::Ok { rows } | Self::PartialMetadataMissing { rows, .. } => *rows,
            _ => 0,
        }
    }

    /// 가격 조회 오류 매핑. 일시적 오류만 재시도 안내 대상입니다.
    fn source(err: &SourceError) -> Self {
        if err.is_transient() {
            Self::SourceUnavailable {
                reason: err.to_string(),
            }
        } else {
            warn!(error = %err, "데이터 소스 응답 사용 불가, 재시도 대상 아님");
            Self::InvalidSymbol
        }
    }

    fn persistence(err: &DataError) -> Self {
        let scope = if err.is_batch_failure() {
            "배치 전체 미반영"
        } else {
            "요청 거부"
        };
        Self::PersistenceFailed {
            reason: format!("{}: {}", scope, err),
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::PartialMetadataMissing => "partial_metadata_missing",
            Self::InvalidSymbol => "invalid_symbol",
            Self::UnsupportedType => "unsupported_type",
            Self::SourceUnavailable => "source_unavailable",
            Self::PersistenceFailed => "persistence_failed",
            Self::Cancelled => "cancelled",
        };
        f.pad(s)
    }
}

impl fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { rows } => write!(f, "완료 ({}행)", rows),
            Self::PartialMetadataMissing { rows, reason } => {
                write!(f, "가격 저장 ({}행), 메타데이터 없음: {}", rows, reason)
            }
            Self::InvalidSymbol => write!(f, "데이터 없는 심볼"),
            Self::UnsupportedType => write!(f, "지원하지 않는 심볼 종류"),
            Self::SourceUnavailable { reason } => {
                write!(f, "데이터 소스 일시 오류, 나중에 다시 시도: {}", reason)
            }
            Self::PersistenceFailed { reason } => write!(f, "저장 실패: {}", reason),
            Self::Cancelled => write!(f, "취소됨"),
        }
    }
}

/// 수집 오케스트레이터.
#[derive(Clone)]
pub struct Ingestor {
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn StockRepository>,
    options: IngestOptions,
    progress: ProgressReporter,
    cancel: CancellationToken,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn StockRepository>,
        options: IngestOptions,
    ) -> Self {
        Self {
            source,
            store,
            options,
            progress: ProgressReporter::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// 진행 이벤트 구독 채널 연결.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.progress = ProgressReporter::new(sender);
        self
    }

    /// 외부 취소 토큰 연결. 심볼 사이에서만 확인합니다.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// 심볼 하나를 수집합니다.
    pub async fn ingest(&self, ticker: &Ticker, mode: FetchMode) -> IngestOutcome {
        if self.cancel.is_cancelled() {
            self.progress
                .emit(ticker, BatchPosition::SINGLE, IngestPhase::Cancelled);
            return IngestOutcome::Cancelled;
        }
        self.ingest_at(ticker, mode, BatchPosition::SINGLE).await
    }

    /// 여러 심볼을 수집합니다. 결과는 입력 순서를 따릅니다.
    ///
    /// 한 심볼의 실패는 나머지에 영향을 주지 않습니다. 취소되면 남은 심볼은 `Cancelled`로 보고되며
    /// 이미 저장된 데이터는 그대로 남습니다.
    pub async fn ingest_batch(&self, requests: &[IngestRequest]) -> Vec<(Ticker, IngestOutcome)> {
        let total = requests.len();
        let concurrency = self.options.concurrency.max(1);

        let mut seen = HashSet::new();
        for request in requests {
            if !seen.insert(&request.ticker) {
                warn!(ticker = %request.ticker, "배치에 중복 티커, 동시 수집은 호출자 책임");
            }
        }

        info!(total, concurrency, source = self.source.name(), "배치 수집 시작");

        let outcomes: Vec<(Ticker, IngestOutcome)> = if concurrency == 1 {
            let mut outcomes = Vec::with_capacity(total);
            for (index, request) in requests.iter().enumerate() {
                let position = BatchPosition { index, total };
                outcomes.push((request.ticker.clone(), self.run_one(request, position).await));
            }
            outcomes
        } else {
            stream::iter(requests.iter().enumerate())
                .map(|(index, request)| async move {
                    let position = BatchPosition { index, total };
                    (request.ticker.clone(), self.run_one(request, position).await)
                })
                .buffered(concurrency)
                .collect()
                .await
        };

        let succeeded = outcomes.iter().filter(|(_, o)| o.is_success()).count();
        info!(total, succeeded, "배치 수집 종료");
        outcomes
    }

    /// 추적 중인 모든 기업/ETF 심볼을 다시 수집합니다.
    pub async fn refresh_tracked(
        &self,
        mode: FetchMode,
    ) -> stockfetch_data::Result<Vec<(Ticker, IngestOutcome)>> {
        let mut tickers = self.store.list_company_tickers().await?;
        tickers.extend(self.store.list_etf_tickers().await?);
        tickers.sort();
        tickers.dedup();

        info!(count = tickers.len(), mode = %mode, "추적 심볼 갱신");

        let requests: Vec<IngestRequest> = tickers
            .into_iter()
            .map(|ticker| IngestRequest::new(ticker, mode))
            .collect();
        Ok(self.ingest_batch(&requests).await)
    }

    async fn run_one(&self, request: &IngestRequest, position: BatchPosition) -> IngestOutcome {
        if position.index > 0 && !self.options.request_delay.is_zero() {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.options.request_delay) => {}
            }
        }

        if self.cancel.is_cancelled() {
            debug!(ticker = %request.ticker, "취소됨, 건너뜀");
            self.progress
                .emit(&request.ticker, position, IngestPhase::Cancelled);
            return IngestOutcome::Cancelled;
        }

        self.ingest_at(&request.ticker, request.mode, position).await
    }

    #[instrument(skip_all, fields(ticker = %ticker, mode = %mode))]
    async fn ingest_at(
        &self,
        ticker: &Ticker,
        mode: FetchMode,
        position: BatchPosition,
    ) -> IngestOutcome {
        let outcome = self.pipeline(ticker, mode, position).await;

        match &outcome {
            IngestOutcome::Ok { rows } => info!(rows, "수집 완료"),
            IngestOutcome::PartialMetadataMissing { rows, reason } => {
                warn!(rows, reason = %reason, "가격 저장 완료, 메타데이터 없음")
            }
            IngestOutcome::InvalidSymbol | IngestOutcome::UnsupportedType => {
                warn!(outcome = %outcome.kind(), "수집 대상 아님")
            }
            IngestOutcome::SourceUnavailable { reason } => {
                warn!(reason = %reason, "데이터 소스 오류")
            }
            IngestOutcome::PersistenceFailed { reason } => error!(reason = %reason, "저장 실패"),
            IngestOutcome::Cancelled => {}
        }

        self.progress
            .emit(ticker, position, IngestPhase::Finished(outcome.kind()));
        outcome
    }

    async fn pipeline(
        &self,
        ticker: &Ticker,
        mode: FetchMode,
        position: BatchPosition,
    ) -> IngestOutcome {
        self.progress.emit(ticker, position, IngestPhase::Classifying);

        if ticker.is_index() {
            return IngestOutcome::UnsupportedType;
        }

        let kind = match self.source.classify(ticker).await {
            Classification::Company => SymbolKind::Company,
            Classification::Etf => SymbolKind::Etf,
            Classification::Unsupported => return self.probe_unsupported(ticker).await,
            Classification::Failed(reason) => {
                return IngestOutcome::SourceUnavailable { reason };
            }
        };
        debug!(kind = %kind, "분류 완료");

        self.progress
            .emit(ticker, position, IngestPhase::FetchingPrices);
        let points = match self.source.fetch_price_series(ticker, mode).await {
            Ok(Some(points)) if !points.is_empty() => points,
            Ok(_) => return IngestOutcome::InvalidSymbol,
            Err(e) => return IngestOutcome::source(&e),
        };

        self.progress.emit(ticker, position, IngestPhase::StoringPrices);
        let report = match self.store.upsert_prices(ticker, &points).await {
            Ok(report) => report,
            Err(e) => return IngestOutcome::persistence(&e),
        };
        if report.dropped > 0 {
            warn!(dropped = report.dropped, "잘못된 가격 행 제외됨");
        }
        if report.written == 0 {
            // 저장 가능한 행이 하나도 없으면 빈 시계열과 같음
            return IngestOutcome::InvalidSymbol;
        }

        let rows = report.written;
        match self.sync_metadata(ticker, kind, position).await {
            MetadataSync::Stored | MetadataSync::Skipped => IngestOutcome::Ok { rows },
            MetadataSync::Missing(reason) => IngestOutcome::PartialMetadataMissing { rows, reason },
            MetadataSync::Failed(outcome) => outcome,
        }
    }

    /// 기업/ETF 어느 쪽도 아닌 심볼: 가격이 있으면 미지원 종류, 없으면 잘못된 심볼.
    async fn probe_unsupported(&self, ticker: &Ticker) -> IngestOutcome {
        match self.source.fetch_price_series(ticker, FetchMode::Recent).await {
            Ok(Some(points)) if !points.is_empty() => IngestOutcome::UnsupportedType,
            Ok(_) => IngestOutcome::InvalidSymbol,
            Err(e) => IngestOutcome::source(&e),
        }
    }

    async fn sync_metadata(
        &self,
        ticker: &Ticker,
        kind: SymbolKind,
        position: BatchPosition,
    ) -> MetadataSync {
        let present = match kind {
            SymbolKind::Company => self.store.has_company(ticker).await,
            SymbolKind::Etf => self.store.has_etf(ticker).await,
        };
        match present {
            Ok(true) if self.options.metadata_refresh == MetadataRefresh::IfMissing => {
                debug!("메타데이터 존재, 조회 생략");
                return MetadataSync::Skipped;
            }
            Ok(_) => {}
            Err(e) => return MetadataSync::Failed(IngestOutcome::persistence(&e)),
        }

        self.progress
            .emit(ticker, position, IngestPhase::FetchingMetadata);

        match kind {
            SymbolKind::Company => {
                let profile = match self.source.fetch_company_profile(ticker).await {
                    Ok(Some(profile)) => profile,
                    Ok(None) => return MetadataSync::Missing("기업 개요 없음".to_string()),
                    Err(e) => return MetadataSync::Missing(e.to_string()),
                };

                self.progress
                    .emit(ticker, position, IngestPhase::StoringMetadata);
                match self.store.upsert_company(&profile).await {
                    Ok(()) => MetadataSync::Stored,
                    Err(e) => MetadataSync::Failed(IngestOutcome::persistence(&e)),
                }
            }
            SymbolKind::Etf => {
                let overview = match self.source.fetch_etf_profile(ticker).await {
                    Ok(Some(overview)) => overview,
                    Ok(None) => return MetadataSync::Missing("ETF 개요 없음".to_string()),
                    Err(e) => return MetadataSync::Missing(e.to_string()),
                };

                self.progress
                    .emit(ticker, position, IngestPhase::StoringMetadata);
                if let Err(e) = self.store.upsert_etf(&overview.profile).await {
                    return MetadataSync::Failed(IngestOutcome::persistence(&e));
                }
                match self
                    .store
                    .replace_holdings(ticker, &overview.holdings, self.options.holdings_policy)
                    .await
                {
                    Ok(count) => {
                        debug!(holdings = count, "보유 종목 저장");
                        MetadataSync::Stored
                    }
                    Err(e) => MetadataSync::Failed(IngestOutcome::persistence(&e)),
                }
            }
        }
    }
}

enum MetadataSync {
    Stored,
    Skipped,
    Missing(String),
    Failed(IngestOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_refresh_parse() {
        assert_eq!("if-missing".parse::<MetadataRefresh>().unwrap(), MetadataRefresh::IfMissing);
        assert_eq!("ALWAYS".parse::<MetadataRefresh>().unwrap(), MetadataRefresh::Always);
        assert!("sometimes".parse::<MetadataRefresh>().is_err());
    }

    #[test]
    fn test_outcome_success_and_rows() {
        let partial = IngestOutcome::PartialMetadataMissing {
            rows: 12,
            reason: "rate limit".into(),
        };
        assert!(partial.is_success());
        assert_eq!(partial.rows(), 12);
        assert_eq!(partial.kind(), OutcomeKind::PartialMetadataMissing);

        assert!(!IngestOutcome::InvalidSymbol.is_success());
        assert_eq!(IngestOutcome::Cancelled.rows(), 0);
        assert_eq!(OutcomeKind::SourceUnavailable.to_string(), "source_unavailable");
    }

    #[test]
    fn test_source_error_mapping() {
        let limited = IngestOutcome::source(&SourceError::RateLimited("chart".into()));
        assert_eq!(limited.kind(), OutcomeKind::SourceUnavailable);

        let status = IngestOutcome::source(&SourceError::Status { status: 400 });
        assert_eq!(status, IngestOutcome::InvalidSymbol);
        let garbled = IngestOutcome::source(&SourceError::Parse("bad json".into()));
        assert_eq!(garbled, IngestOutcome::InvalidSymbol);
    }

    #[test]
    fn test_persistence_reason_scope() {
        let lost = IngestOutcome::persistence(&DataError::PoolExhausted);
        assert!(lost.to_string().contains("배치 전체 미반영"));

        let rejected = IngestOutcome::persistence(&DataError::NotFound("심볼 VOO".into()));
        assert!(rejected.to_string().contains("요청 거부"));
    }
}
