//! 주식/ETF 가격 이력 수집 CLI.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Instant;
use stockfetch_collector::{
    CollectionStats, CollectorConfig, IngestOutcome, IngestPhase, IngestRequest, Ingestor,
    ProgressEvent,
};
use stockfetch_core::{init_logging, FetchMode, LogConfig, LogFormat, Ticker};
use stockfetch_data::{Database, HttpMarketDataSource, StockStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "stockfetch-collector")]
#[command(about = "Stock and ETF price history collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    /// span 진입/종료 로그 출력
    #[arg(long)]
    log_spans: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 스키마 마이그레이션 실행
    Migrate,

    /// 지정한 심볼 수집
    Ingest {
        /// 쉼표로 구분한 심볼 (예: "AAPL,VOO")
        #[arg(long)]
        symbols: String,

        /// 전체 이력 수집 (기본: 최근 구간)
        #[arg(long)]
        full: bool,
    },

    /// 추적 중인 모든 심볼 갱신
    Update {
        #[arg(long)]
        full: bool,
    },

    /// 추적 중인 심볼 목록
    List,

    /// 저장된 기업 개요 조회
    Profile { symbol: String },

    /// ETF 보유 종목 조회
    Holdings { etf: String },

    /// 가격 이력 조회
    History {
        symbol: String,

        /// 시작일 (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// 종료일 (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(
        LogConfig::new(&cli.log_level)
            .with_format(cli.log_format)
            .with_span_events(cli.log_spans),
    )
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("Stockfetch Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        max_connections = config.database.max_connections,
        concurrency = config.ingest.concurrency,
        "설정 로드 완료"
    );

    // DB 연결
    let db = Database::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    db.health_check().await.context("데이터베이스 상태 확인 실패")?;
    let store = StockStore::new(db.clone());

    // 명령 실행
    match cli.command {
        Commands::Migrate => {
            db.migrate().await?;
        }
        Commands::Ingest { symbols, full } => {
            let mode = FetchMode::from_full(full);
            let requests = symbols
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| Ticker::parse(s).map(|t| IngestRequest::new(t, mode)))
                .collect::<Result<Vec<_>, _>>()?;

            let ingestor = build_ingestor(&config, store.clone())?;
            let start = Instant::now();
            let outcomes = ingestor.ingest_batch(&requests).await;
            report(&outcomes);
            finish(&outcomes, start, "심볼 수집");
        }
        Commands::Update { full } => {
            let ingestor = build_ingestor(&config, store.clone())?;
            let start = Instant::now();
            let outcomes = ingestor.refresh_tracked(FetchMode::from_full(full)).await?;
            report(&outcomes);
            finish(&outcomes, start, "추적 심볼 갱신");
        }
        Commands::List => {
            for tracked in store.list_tracked_symbols().await? {
                let latest = store.latest_price_date(&tracked.ticker).await?;
                println!(
                    "{:<10} {:<8} {}",
                    tracked.ticker,
                    tracked.kind,
                    reported(latest)
                );
            }
        }
        Commands::Profile { symbol } => {
            let ticker = Ticker::parse(&symbol)?;
            match store.get_company_profile(&ticker).await? {
                Some(profile) => {
                    println!("{} - {}", profile.ticker, profile.name);
                    println!("PER          {}", reported(profile.pe_ratio()));
                    println!("발행 주식    {}", reported(profile.shares_outstanding()));
                    println!("유통 주식    {}", reported(profile.shares_float()));
                    println!("공매도 잔고  {}", reported(profile.shares_short()));
                    if !profile.description.is_empty() {
                        println!("\n{}", profile.description);
                    }
                }
                None => tracing::warn!(ticker = %ticker, "저장된 기업 개요 없음"),
            }
        }
        Commands::Holdings { etf } => {
            let etf = Ticker::parse(&etf)?;
            match store.get_etf_profile(&etf).await? {
                Some(profile) => println!("{} - {}", profile.ticker, profile.name),
                None => tracing::warn!(etf = %etf, "저장된 ETF 개요 없음"),
            }
            for holding in store.get_etf_holdings(&etf).await? {
                println!("{:<10} {:>7}%", holding.ticker, holding.percent);
            }
        }
        Commands::History { symbol, from, to } => {
            let ticker = Ticker::parse(&symbol)?;
            let stored = store.has_price_data(&ticker).await?;
            if !stored {
                tracing::warn!(ticker = %ticker, "저장된 가격 없음");
            }
            let rows = match (from, to) {
                _ if !stored => Vec::new(),
                (Some(from), Some(to)) => store.get_price_history_range(&ticker, from, to).await?,
                (from, to) => store
                    .get_price_history(&ticker)
                    .await?
                    .into_iter()
                    .filter(|p| from.map_or(true, |f| p.date >= f) && to.map_or(true, |t| p.date <= t))
                    .collect(),
            };
            for p in rows {
                println!(
                    "{} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
                    p.date, p.open, p.high, p.low, p.close, p.adjusted_close, p.volume
                );
            }
        }
    }

    db.close().await;
    tracing::info!("Stockfetch Collector 종료");

    Ok(())
}

/// Ctrl-C 시 취소되는 수집기 생성. 진행 이벤트는 로그로 출력합니다.
fn build_ingestor(config: &CollectorConfig, store: StockStore) -> anyhow::Result<Ingestor> {
    let source = HttpMarketDataSource::new(&config.source)?;

    let shutdown_token = CancellationToken::new();
    let token = shutdown_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 남은 심볼 취소 중...");
            token.cancel();
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.phase {
                IngestPhase::Finished(kind) => tracing::info!(
                    ticker = %event.ticker,
                    outcome = %kind,
                    progress = format!("{:.0}%", event.fraction * 100.0),
                    "심볼 처리"
                ),
                phase => tracing::debug!(ticker = %event.ticker, phase = ?phase, "진행"),
            }
        }
    });

    Ok(Ingestor::new(Arc::new(source), Arc::new(store), config.ingest.options())
        .with_progress(tx)
        .with_cancellation(shutdown_token))
}

fn finish(outcomes: &[(Ticker, IngestOutcome)], start: Instant, label: &str) {
    let stats = CollectionStats::from_outcomes(outcomes, start.elapsed());
    stats.log_summary(label);
    if stats.has_failures() {
        tracing::warn!(label, "일부 심볼 수집 실패, 위 결과 확인 필요");
    }
}

/// 미보고 수치는 "-"로 출력
fn reported<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn report(outcomes: &[(Ticker, IngestOutcome)]) {
    for (ticker, outcome) in outcomes {
        println!("{:<10} {:<26} {}", ticker, outcome.kind(), outcome);
    }
}
