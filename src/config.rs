//! Router Configuration
//!
//! 라우터 설정

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DEFAULT_TRANSIENT_PATTERNS;
use crate::observer::{DispatchObserver, TracingObserver};

// ============================================================================
// SelectionMode - 선택 모드
// ============================================================================

/// 엔드포인트 선택 모드
///
/// 프로세스 전역 정책입니다. 호출 체인 범위 상태(SelectionContext)와 달리
/// 생성 시점에 한 번 설정됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// 호출마다 랜덤 선택
    Random,
    /// 컨텍스트 범위 내에서 처음 선택한 엔드포인트 재사용
    #[default]
    Sticky,
}

// ============================================================================
// AllDownHook - 전체 다운 훅
// ============================================================================

/// 모든 엔드포인트가 다운됐을 때 호출되는 정책 훅
///
/// 수퍼바이저가 프로세스를 재시작할 수 있도록 종료를 신호하는 용도로
/// 쓸 수 있습니다. 설정하지 않으면 에러 전파만 일어납니다.
pub type AllDownHook = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// RouterConfig - 라우터 설정
// ============================================================================

/// 라우터 설정
///
/// # 필드
///
/// | 필드 | 기본값 | 설명 |
/// |------|--------|------|
/// | `replica_quarantine` | 30초 | 읽기 엔드포인트 격리 시간 |
/// | `primary_suppression` | 30초 | primary 억제 시간 |
/// | `transient_patterns` | 기본 시그니처 | 트랜지언트 연결 에러 패턴 |
/// | `read_selection` | Sticky | 읽기 엔드포인트 선택 모드 |
/// | `backup_selection` | Sticky | 백업 엔드포인트 선택 모드 |
/// | `query_cache_enabled` | false | 쿼리 결과 캐시 사용 여부 |
#[derive(Clone)]
pub struct RouterConfig {
    /// 읽기 엔드포인트 격리 시간
    pub replica_quarantine: Duration,
    /// primary 억제 시간
    pub primary_suppression: Duration,
    /// 트랜지언트 연결 에러 시그니처
    pub transient_patterns: Vec<String>,
    /// 읽기 엔드포인트 선택 모드
    pub read_selection: SelectionMode,
    /// 백업 엔드포인트 선택 모드
    pub backup_selection: SelectionMode,
    /// 쿼리 결과 캐시 사용 여부
    pub query_cache_enabled: bool,
    /// 전체 다운 정책 훅
    pub all_down_hook: Option<AllDownHook>,
    /// 디스패치 관측자
    pub observer: Arc<dyn DispatchObserver>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            replica_quarantine: Duration::from_secs(30),
            primary_suppression: Duration::from_secs(30),
            transient_patterns: DEFAULT_TRANSIENT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            read_selection: SelectionMode::default(),
            backup_selection: SelectionMode::default(),
            query_cache_enabled: false,
            all_down_hook: None,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl RouterConfig {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 시작
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("replica_quarantine", &self.replica_quarantine)
            .field("primary_suppression", &self.primary_suppression)
            .field("transient_patterns", &self.transient_patterns)
            .field("read_selection", &self.read_selection)
            .field("backup_selection", &self.backup_selection)
            .field("query_cache_enabled", &self.query_cache_enabled)
            .field("all_down_hook", &self.all_down_hook.is_some())
            .finish()
    }
}

// ============================================================================
// RouterConfigBuilder - 설정 빌더
// ============================================================================

/// 라우터 설정 빌더
#[derive(Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// 읽기 엔드포인트 격리 시간 설정
    pub fn replica_quarantine(mut self, duration: Duration) -> Self {
        self.config.replica_quarantine = duration;
        self
    }

    /// primary 억제 시간 설정
    pub fn primary_suppression(mut self, duration: Duration) -> Self {
        self.config.primary_suppression = duration;
        self
    }

    /// 트랜지언트 시그니처 설정
    pub fn transient_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.transient_patterns = patterns;
        self
    }

    /// 읽기 선택 모드 설정
    pub fn read_selection(mut self, mode: SelectionMode) -> Self {
        self.config.read_selection = mode;
        self
    }

    /// 백업 선택 모드 설정
    pub fn backup_selection(mut self, mode: SelectionMode) -> Self {
        self.config.backup_selection = mode;
        self
    }

    /// 쿼리 캐시 활성화
    pub fn with_query_cache(mut self) -> Self {
        self.config.query_cache_enabled = true;
        self
    }

    /// 전체 다운 정책 훅 설정
    pub fn all_down_hook(mut self, hook: AllDownHook) -> Self {
        self.config.all_down_hook = Some(hook);
        self
    }

    /// 디스패치 관측자 설정
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.config.observer = observer;
        self
    }

    /// 설정 빌드
    pub fn build(self) -> RouterConfig {
        self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
