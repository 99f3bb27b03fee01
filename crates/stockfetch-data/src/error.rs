//! 데이터 모듈 오류 타입.

use stockfetch_core::ValidationError;
use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DataError {
    /// 요청 전체가 반영되지 않은 실패인지 여부.
    ///
    /// 개별 행 누락(잘못된 행)은 에러가 아니라 `UpsertReport::dropped`로 집계됩니다.
    pub fn is_batch_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::QueryError(_) | Self::PoolExhausted
        )
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    DataError::DuplicateError(db_err.message().to_string())
                } else {
                    DataError::QueryError(db_err.message().to_string())
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<ValidationError> for DataError {
    fn from(err: ValidationError) -> Self {
        DataError::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 외부 데이터 소스 오류.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("요청 시간 초과: {0}")]
    Timeout(String),

    #[error("Rate limit 초과: {0}")]
    RateLimited(String),

    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    #[error("예상치 못한 응답 상태: {status}")]
    Status { status: u16 },
}

impl SourceError {
    /// 재요청으로 회복될 수 있는 일시적 오류인지 여부.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::Parse(_) => false,
        }
    }

    /// reqwest 오류를 타임아웃 여부에 따라 분류합니다.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_transient() {
        assert!(SourceError::Timeout("read".into()).is_transient());
        assert!(SourceError::RateLimited("5 calls/min".into()).is_transient());
        assert!(SourceError::Status { status: 503 }.is_transient());
        assert!(!SourceError::Status { status: 404 }.is_transient());
        assert!(!SourceError::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn test_batch_failure_classification() {
        assert!(DataError::PoolExhausted.is_batch_failure());
        assert!(DataError::QueryError("conn reset".into()).is_batch_failure());
        assert!(!DataError::NotFound("ETF VOO".into()).is_batch_failure());
    }
}
