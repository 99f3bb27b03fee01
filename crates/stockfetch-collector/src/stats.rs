//! 수집 통계 구조체.

use crate::modules::{IngestOutcome, OutcomeKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stockfetch_core::Ticker;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 심볼 수
    pub total: usize,
    /// 가격과 메타데이터 모두 저장
    pub success: usize,
    /// 가격만 저장 (메타데이터 없음)
    pub partial: usize,
    /// 데이터 없는 심볼
    pub invalid: usize,
    /// 미지원 종류 (지수 등)
    pub unsupported: usize,
    /// 소스 일시 오류
    pub unavailable: usize,
    /// 저장 실패
    pub persistence_errors: usize,
    /// 취소로 처리하지 않은 심볼
    pub cancelled: usize,
    /// 저장된 총 가격 행 수
    pub total_rows: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼별 결과 집계
    pub fn from_outcomes(outcomes: &[(Ticker, IngestOutcome)], elapsed: Duration) -> Self {
        let mut stats = Self {
            elapsed,
            ..Self::default()
        };
        for (_, outcome) in outcomes {
            stats.record(outcome);
        }
        stats
    }

    pub fn record(&mut self, outcome: &IngestOutcome) {
        self.total += 1;
        self.total_rows += outcome.rows();
        match outcome.kind() {
            OutcomeKind::Ok => self.success += 1,
            OutcomeKind::PartialMetadataMissing => self.partial += 1,
            OutcomeKind::InvalidSymbol => self.invalid += 1,
            OutcomeKind::UnsupportedType => self.unsupported += 1,
            OutcomeKind::SourceUnavailable => self.unavailable += 1,
            OutcomeKind::PersistenceFailed => self.persistence_errors += 1,
            OutcomeKind::Cancelled => self.cancelled += 1,
        }
    }

    /// 가격 저장 성공률 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.success + self.partial) as f64 / self.total as f64) * 100.0
        }
    }

    /// 실패가 하나라도 있는지 (취소/미지원 제외)
    pub fn has_failures(&self) -> bool {
        self.invalid + self.unavailable + self.persistence_errors > 0
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            partial = self.partial,
            invalid = self.invalid,
            unsupported = self.unsupported,
            unavailable = self.unavailable,
            persistence_errors = self.persistence_errors,
            cancelled = self.cancelled,
            total_rows = self.total_rows,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcomes() {
        let t = |s: &str| Ticker::parse(s).unwrap();
        let outcomes = vec![
            (t("CRSR"), IngestOutcome::Ok { rows: 10 }),
            (t("BADSYM"), IngestOutcome::InvalidSymbol),
            (
                t("VOO"),
                IngestOutcome::PartialMetadataMissing {
                    rows: 5,
                    reason: "rate limit".into(),
                },
            ),
            (t("QQQ"), IngestOutcome::Cancelled),
        ];

        let stats = CollectionStats::from_outcomes(&outcomes, Duration::from_secs(2));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.partial, 1);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.total_rows, 15);
        assert_eq!(stats.success_rate(), 50.0);
        assert!(stats.has_failures());
    }
}
