//! HTTP 소스 공통 설정.

use crate::error::SourceError;
use reqwest::Client;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 외부 소스 접속 설정.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// 연결 타임아웃
    pub connect_timeout: Duration,
    /// 요청 전체(응답 수신 포함) 타임아웃
    pub read_timeout: Duration,
    pub user_agent: String,
    pub yahoo_base_url: String,
    pub alphavantage_base_url: String,
    pub marketwatch_base_url: String,
    pub alphavantage_api_key: Arc<SecretString>,
    /// `FetchMode::Recent` 구간 일수
    pub recent_days: i64,
}

impl SourceConfig {
    pub fn new(alphavantage_api_key: SecretString) -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
            read_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            alphavantage_base_url: "https://www.alphavantage.co".to_string(),
            marketwatch_base_url: "https://www.marketwatch.com".to_string(),
            alphavantage_api_key: Arc::new(alphavantage_api_key),
            recent_days: 100,
        }
    }
}

/// 타임아웃이 적용된 HTTP 클라이언트 생성.
pub fn build_http_client(config: &SourceConfig) -> Result<Client, SourceError> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(SourceError::Http)
}

/// 끝의 `/`를 제거한 기본 URL.
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
