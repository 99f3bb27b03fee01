//! 수집 진행 이벤트.

use super::ingest::OutcomeKind;
use serde::Serialize;
use stockfetch_core::Ticker;
use tokio::sync::mpsc;

/// 심볼 수집 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Classifying,
    FetchingPrices,
    StoringPrices,
    FetchingMetadata,
    StoringMetadata,
    Finished(OutcomeKind),
    Cancelled,
}

impl IngestPhase {
    /// 심볼 하나 안에서의 진행률.
    fn step(self) -> f64 {
        match self {
            Self::Classifying => 0.0,
            Self::FetchingPrices => 0.2,
            Self::StoringPrices => 0.4,
            Self::FetchingMetadata => 0.6,
            Self::StoringMetadata => 0.8,
            Self::Finished(_) | Self::Cancelled => 1.0,
        }
    }
}

/// 진행 이벤트.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub ticker: Ticker,
    pub phase: IngestPhase,
    /// 배치 전체 진행률 (0.0 ~ 1.0)
    pub fraction: f64,
}

/// 배치 안에서 심볼의 위치.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchPosition {
    pub index: usize,
    pub total: usize,
}

impl BatchPosition {
    pub const SINGLE: Self = Self { index: 0, total: 1 };

    pub fn fraction(self, phase: IngestPhase) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        ((self.index as f64 + phase.step()) / self.total as f64).clamp(0.0, 1.0)
    }
}

/// 진행 이벤트 발행기. 구독자가 없으면 아무것도 하지 않습니다.
#[derive(Clone, Default)]
pub(crate) struct ProgressReporter {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn emit(&self, ticker: &Ticker, position: BatchPosition, phase: IngestPhase) {
        if let Some(sender) = &self.sender {
            // 구독자가 떠나도 수집은 계속
            let _ = sender.send(ProgressEvent {
                ticker: ticker.clone(),
                phase,
                fraction: position.fraction(phase),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_is_batch_wide() {
        let second_of_four = BatchPosition { index: 1, total: 4 };
        assert_eq!(second_of_four.fraction(IngestPhase::Classifying), 0.25);
        assert_eq!(
            second_of_four.fraction(IngestPhase::Finished(OutcomeKind::Ok)),
            0.5
        );
        assert_eq!(BatchPosition::SINGLE.fraction(IngestPhase::Cancelled), 1.0);
    }

    #[tokio::test]
    async fn test_reporter_without_subscriber_is_silent() {
        let ticker = Ticker::parse("CRSR").unwrap();
        ProgressReporter::default().emit(&ticker, BatchPosition::SINGLE, IngestPhase::Classifying);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::new(tx);
        reporter.emit(&ticker, BatchPosition::SINGLE, IngestPhase::FetchingPrices);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.phase, IngestPhase::FetchingPrices);
        assert_eq!(event.fraction, 0.2);
    }
}
