//! Router Error Types
//!
//! 라우터 에러 정의

use thiserror::Error;

// ============================================================================
// PoolError - 라우터 에러
// ============================================================================

/// 라우터 에러
#[derive(Error, Debug)]
pub enum PoolError {
    /// 연결 에러 (엔드포인트 장애)
    #[error("Connection error: {0}")]
    Connection(String),

    /// 타임아웃 에러
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 취소된 작업
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// 스테이트먼트 에러 (잘못된 SQL, 제약 조건 위반 등)
    #[error("Statement error: {0}")]
    Statement(String),

    /// 선택 가능한 엔드포인트 없음
    #[error("No endpoint available: {0}")]
    NoAvailableEndpoint(String),

    /// 모든 엔드포인트 사용 불가 (primary 억제 + 읽기 풀 비어 있음)
    #[error("All endpoints are down")]
    AllEndpointsDown,

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 취소 에러 생성
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// 스테이트먼트 에러 생성
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// 엔드포인트 없음 에러 생성
    pub fn no_available_endpoint(msg: impl Into<String>) -> Self {
        Self::NoAvailableEndpoint(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 엔드포인트 장애 여부
    ///
    /// 격리/재시도 대상이 되는 에러인지 판별합니다. 스테이트먼트 에러는
    /// 드라이버가 반환한 그대로 호출자에게 전파되며 격리를 유발하지 않습니다.
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// 취소 여부
    ///
    /// 취소된 작업은 트랜지언트 에러로 간주하지 않으며 격리를 유발하지 않습니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 라우터 결과 타입
pub type PoolResult<T> = Result<T, PoolError>;

// ============================================================================
// Transient Signature Matching
// ============================================================================

/// 기본 트랜지언트 연결 에러 시그니처
///
/// 이 메시지와 매칭되는 연결 장애는 같은 엔드포인트에서 재연결 후
/// 1회 재시도할 수 있습니다.
pub const DEFAULT_TRANSIENT_PATTERNS: &[&str] = &[
    "server has gone away",
    "lost connection",
    "packet too large",
];

/// 에러 메시지가 트랜지언트 시그니처와 매칭되는지 확인 (대소문자 무시)
pub fn matches_transient_signature(message: &str, patterns: &[String]) -> bool {
    let message = message.to_lowercase();
    patterns.iter().any(|p| message.contains(&p.to_lowercase()))
}

// ============================================================================
// Tests
// ============================================================================
