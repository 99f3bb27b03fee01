//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::modules::{IngestOptions, MetadataRefresh};
use crate::Result;
use secrecy::SecretString;
use std::time::Duration;
use stockfetch_data::{DatabaseConfig, HoldingsPolicy, SourceConfig};

/// Alpha Vantage 공개 데모 키 (ALPHAVANTAGE_API_KEY 미설정 시)
const DEMO_API_KEY: &str = "demo";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 외부 데이터 소스 설정
    pub source: SourceConfig,
    /// 수집 설정
    pub ingest: IngestConfig,
}

/// 수집 설정
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    pub metadata_refresh: MetadataRefresh,
    pub holdings_policy: HoldingsPolicy,
    /// 동시 수집 심볼 수
    pub concurrency: usize,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let mut database = DatabaseConfig::new(database_url);
        database.max_connections = env_var_parse("DATABASE_MAX_CONNECTIONS", 10);
        database.min_connections = env_var_parse("DATABASE_MIN_CONNECTIONS", 1);
        database.connect_timeout_secs = env_var_parse("DATABASE_CONNECT_TIMEOUT_SECS", 30);

        let api_key = std::env::var("ALPHAVANTAGE_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("ALPHAVANTAGE_API_KEY 미설정, 데모 키 사용 (기업 개요 수집 제한)");
            DEMO_API_KEY.to_string()
        });

        let mut source = SourceConfig::new(SecretString::new(api_key.into()));
        source.connect_timeout = Duration::from_secs(env_var_parse("SOURCE_CONNECT_TIMEOUT_SECS", 20));
        source.read_timeout = Duration::from_secs(env_var_parse("SOURCE_READ_TIMEOUT_SECS", 30));
        source.recent_days = positive_days(
            "INGEST_RECENT_DAYS",
            env_var_parse("INGEST_RECENT_DAYS", 100),
        )?;
        if let Ok(url) = std::env::var("YAHOO_BASE_URL") {
            source.yahoo_base_url = url;
        }
        if let Ok(url) = std::env::var("ALPHAVANTAGE_BASE_URL") {
            source.alphavantage_base_url = url;
        }
        if let Ok(url) = std::env::var("MARKETWATCH_BASE_URL") {
            source.marketwatch_base_url = url;
        }

        Ok(Self {
            database,
            source,
            ingest: IngestConfig {
                request_delay_ms: env_var_parse("INGEST_REQUEST_DELAY_MS", 0),
                metadata_refresh: env_var_choice("INGEST_METADATA_REFRESH")?,
                holdings_policy: env_var_choice("INGEST_HOLDINGS_POLICY")?,
                concurrency: env_var_parse("INGEST_CONCURRENCY", 1usize).max(1),
            },
        })
    }
}

impl IngestConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 오케스트레이터 옵션으로 변환
    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            request_delay: self.request_delay(),
            metadata_refresh: self.metadata_refresh,
            holdings_policy: self.holdings_policy,
            concurrency: self.concurrency,
        }
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 일 수 설정은 1 이상이어야 합니다.
fn positive_days(key: &str, days: i64) -> Result<i64> {
    if days <= 0 {
        return Err(CollectorError::Config(format!(
            "{}: 1 이상이어야 합니다 ({})",
            key, days
        )));
    }
    Ok(days)
}

/// 정책 값 파싱. 미설정이면 기본값, 알 수 없는 값이면 설정 에러.
fn env_var_choice<T>(key: &str) -> Result<T>
where
    T: std::str::FromStr<Err = stockfetch_core::ValidationError> + Default,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|e| CollectorError::Config(format!("{}: {}", key, e))),
        Err(_) => Ok(T::default()),
    }
}
