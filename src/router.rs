//! Pool Router
//!
//! 읽기/쓰기 분리 라우팅과 장애 조치의 중심 구현

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::availability::{AvailabilityStack, PrimarySuppression};
use crate::cache::QueryCache;
use crate::config::{RouterConfig, SelectionMode};
use crate::context::SelectionContext;
use crate::endpoint::EndpointRef;
use crate::error::{matches_transient_signature, PoolError, PoolResult};
use crate::observer::DispatchOutcome;
use crate::selector::WeightedEndpointSet;
use crate::statement::{RoutingClass, Statement, StatementResult};

// ============================================================================
// RouterMetrics - 라우터 메트릭
// ============================================================================

/// 라우터 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterMetrics {
    /// 전체 엔드포인트 수 (primary 포함)
    pub endpoints: usize,
    /// 현재 가용 읽기 집합 크기 (가중치 반복 포함)
    pub read_set_size: usize,
    /// 가용성 스택 깊이
    pub stack_depth: usize,
    /// primary 억제 중 여부
    pub primary_suppressed: bool,
    /// 캐시된 쿼리 수
    pub cached_queries: usize,
}

// ============================================================================
// Attempt - 시도 단계
// ============================================================================

/// 디스패치 시도 단계
///
/// 같은 호출 체인에서 재시도는 유한합니다. 같은 엔드포인트 재연결 재시도
/// 최대 1회, 대체 엔드포인트 재시도 최대 1회입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// 첫 시도 (재연결 재시도 가능)
    First,
    /// 대체 엔드포인트에서의 재시도 (추가 장애 조치 없음)
    Retry,
}

// ============================================================================
// PoolRouter - 풀 라우터
// ============================================================================

/// 풀 라우터
///
/// 하나의 쓰기 가능 primary와 N개의 가중치 읽기 엔드포인트 앞에서
/// 스테이트먼트를 라우팅합니다. 변경과 primary 전용 작업은 primary로,
/// 읽기는 가중치 랜덤으로 선택된 읽기 엔드포인트로 보냅니다.
///
/// 엔드포인트 장애는 격리 스택과 primary 억제 상태로 관리되며, 만료 검사는
/// 선택 시점에 지연 수행됩니다. 부기(선택, 격리, 억제)만 락 아래에서
/// 수행되고 실제 데이터베이스 호출은 락 밖에서 일어나므로 한 호출자의
/// 네트워크 대기가 다른 호출자를 막지 않습니다.
///
/// # 예시
///
/// ```no_run
/// # use std::collections::HashMap;
/// # use splitpool::{PoolRouter, RouterConfig, Statement};
/// # async fn run(primary: splitpool::EndpointRef, replicas: Vec<splitpool::EndpointRef>) -> splitpool::PoolResult<()> {
/// let router = PoolRouter::new(primary, replicas, HashMap::new(), RouterConfig::default());
///
/// let stmt = Statement::new("select", "SELECT id FROM users");
/// let result = router.dispatch(&stmt).await?;
/// # drop(result);
/// # Ok(())
/// # }
/// ```
pub struct PoolRouter {
    /// 쓰기 가능 primary
    primary: EndpointRef,
    /// 읽기 엔드포인트 목록 (가중치 0 포함, 팬아웃 대상)
    replicas: Vec<EndpointRef>,
    /// 가중치 인코딩된 읽기 집합
    weighted: WeightedEndpointSet,
    /// 가용성 스택
    available: Mutex<AvailabilityStack>,
    /// primary 억제 상태
    suppression: Mutex<PrimarySuppression>,
    /// 쿼리 결과 캐시
    cache: QueryCache,
    /// 라우터 설정
    config: RouterConfig,
}

impl PoolRouter {
    /// 새 라우터 생성
    ///
    /// 가중치 맵에 없는 읽기 엔드포인트의 가중치는 1이며, 가중치 0은 읽기
    /// 집합에서 제외하되 팬아웃 작업에는 계속 참여시킵니다.
    pub fn new(
        primary: EndpointRef,
        replicas: Vec<EndpointRef>,
        weights: std::collections::HashMap<EndpointRef, u32>,
        config: RouterConfig,
    ) -> Self {
        let weighted = WeightedEndpointSet::build(&replicas, &weights);
        let available = Mutex::new(AvailabilityStack::new(weighted.entries().to_vec()));
        let cache = QueryCache::new(config.query_cache_enabled);

        Self {
            primary,
            replicas,
            weighted,
            available,
            suppression: Mutex::new(PrimarySuppression::new()),
            cache,
            config,
        }
    }

    // ========================================================================
    // 디스패치
    // ========================================================================

    /// 스테이트먼트 디스패치
    ///
    /// 라우팅 클래스에 따라 대상 엔드포인트를 정하고 장애 조치 프로토콜을
    /// 적용합니다. 변경 오퍼레이션은 디스패치 전에 쿼리 캐시를 무효화합니다.
    pub async fn dispatch(&self, stmt: &Statement) -> PoolResult<StatementResult> {
        match stmt.routing_class() {
            RoutingClass::Read => self.dispatch_read(stmt).await,
            RoutingClass::Write => {
                self.cache.clear();
                self.proxy(self.primary.clone(), stmt, Attempt::First).await
            }
            RoutingClass::PrimaryOnly => {
                self.proxy(self.primary.clone(), stmt, Attempt::First).await
            }
        }
    }

    /// 읽기 디스패치
    async fn dispatch_read(&self, stmt: &Statement) -> PoolResult<StatementResult> {
        if self.cache.is_enabled() {
            let key = stmt.cache_key();
            if let Some(hit) = self.cache.fetch(&key) {
                debug!(op = stmt.op(), "query cache hit");
                return Ok(hit);
            }

            let endpoint = self.read_endpoint().await?;
            let result = self.proxy(endpoint, stmt, Attempt::First).await?;
            self.cache.store(key, result.clone());
            return Ok(result);
        }

        let endpoint = self.read_endpoint().await?;
        self.proxy(endpoint, stmt, Attempt::First).await
    }

    /// 선택된 엔드포인트에서 오퍼레이션 실행
    ///
    /// 트랜지언트 연결 에러는 첫 시도에 한해 강제 disconnect 후 같은
    /// 엔드포인트에서 정확히 1회 재시도합니다. 그 외 엔드포인트 장애는
    /// 격리/억제 후 대체 엔드포인트로 넘어갑니다. 스테이트먼트 에러와
    /// 취소는 원본 그대로 즉시 전파됩니다.
    fn proxy<'a>(
        &'a self,
        target: EndpointRef,
        stmt: &'a Statement,
        attempt: Attempt,
    ) -> Pin<Box<dyn Future<Output = PoolResult<StatementResult>> + Send + 'a>> {
        Box::pin(async move {
            let mut reconnected = false;
            loop {
                match target.execute(stmt).await {
                    Ok(result) => {
                        let outcome = if reconnected {
                            DispatchOutcome::Retried
                        } else {
                            DispatchOutcome::Success
                        };
                        self.config.observer.on_dispatch(target.name(), stmt.op(), outcome);
                        return Ok(result);
                    }
                    // 취소는 엔드포인트 장애가 아니며 격리를 유발하지 않음
                    Err(err) if err.is_cancelled() => return Err(err),
                    // 스테이트먼트 에러는 원본 그대로 전파
                    Err(err) if !err.is_endpoint_failure() => {
                        self.config
                            .observer
                            .on_dispatch(target.name(), stmt.op(), DispatchOutcome::Failed);
                        return Err(err);
                    }
                    Err(err) => {
                        let transient = matches_transient_signature(
                            &err.to_string(),
                            &self.config.transient_patterns,
                        );
                        if attempt == Attempt::First && !reconnected && transient {
                            warn!(
                                endpoint = target.name(),
                                error = %err,
                                "transient connection error, retrying on same endpoint"
                            );
                            let _ = target.disconnect().await;
                            reconnected = true;
                            continue;
                        }

                        self.config
                            .observer
                            .on_dispatch(target.name(), stmt.op(), DispatchOutcome::Failed);

                        if attempt == Attempt::Retry {
                            // 대체 엔드포인트에서의 재시도도 실패하면 여기서 끝
                            return Err(err);
                        }
                        return self.failover(target, stmt, err).await;
                    }
                }
            }
        })
    }

    /// 장애 조치
    ///
    /// 실패한 엔드포인트를 격리(읽기) 또는 억제(primary)하고, 선택 규칙으로
    /// 대체 엔드포인트를 구해 원래 오퍼레이션을 1회 재시도합니다. 대체
    /// 엔드포인트가 없으면 원본 에러를 전파합니다.
    async fn failover(
        &self,
        failed: EndpointRef,
        stmt: &Statement,
        err: PoolError,
    ) -> PoolResult<StatementResult> {
        if failed == self.primary {
            self.suppress_primary();
        } else {
            self.quarantine_replica(&failed);
        }

        let Some(alternative) = self.alternative_endpoint(&failed).await else {
            return Err(err);
        };

        warn!(
            failed = failed.name(),
            alternative = alternative.name(),
            "failing over to alternative endpoint"
        );

        // 같은 범위의 후속 호출이 대체 엔드포인트를 재사용하도록 고정
        SelectionContext::pin(alternative.clone());
        self.proxy(alternative, stmt, Attempt::Retry).await
    }

    // ========================================================================
    // 엔드포인트 선택
    // ========================================================================

    /// 읽기 오퍼레이션 대상 엔드포인트 선택
    ///
    /// primary 강제 중이면 primary, sticky 모드에서 유효한 고정이 있으면
    /// 고정된 엔드포인트, 아니면 현재 가용 집합에서 가중치 랜덤 선택합니다.
    /// 가용 집합이 비어 있으면 백업으로 primary(사용 가능할 때)를 씁니다.
    async fn read_endpoint(&self) -> PoolResult<EndpointRef> {
        if SelectionContext::forcing_primary() {
            return Ok(self.primary.clone());
        }

        let current = self.available_read_endpoints().await;

        if self.config.read_selection == SelectionMode::Sticky {
            if let Some(pinned) = SelectionContext::pinned() {
                if current.contains(&pinned) {
                    return Ok(pinned);
                }
                // 고정 대상이 격리됨
                SelectionContext::clear_pin();
            }
        }

        if let Some(chosen) = WeightedEndpointSet::pick(&current) {
            if self.config.read_selection == SelectionMode::Sticky {
                SelectionContext::pin(chosen.clone());
            }
            return Ok(chosen);
        }

        // 읽기 집합이 비어 있음 - 백업 경로
        if self.primary_usable().await {
            return Ok(self.primary.clone());
        }

        if self.available.lock().all_unavailable() {
            Err(PoolError::AllEndpointsDown)
        } else {
            Err(PoolError::no_available_endpoint(
                "no read endpoint and primary is suppressed",
            ))
        }
    }

    /// 장애 조치용 대체 엔드포인트 선택
    ///
    /// sticky 백업 모드에서는 유효한 고정을 먼저 고려합니다. 실패한
    /// 엔드포인트는 후보에서 제외되며, 읽기 집합이 비어 있으면 사용 가능한
    /// primary가 백업이 됩니다.
    async fn alternative_endpoint(&self, failed: &EndpointRef) -> Option<EndpointRef> {
        let current: Vec<EndpointRef> = self
            .available_read_endpoints()
            .await
            .into_iter()
            .filter(|e| e != failed)
            .collect();

        if self.config.backup_selection == SelectionMode::Sticky {
            if let Some(pinned) = SelectionContext::pinned() {
                if &pinned != failed && current.contains(&pinned) {
                    return Some(pinned);
                }
            }
        }

        if let Some(chosen) = WeightedEndpointSet::pick(&current) {
            return Some(chosen);
        }

        if failed != &self.primary && self.primary_usable().await {
            return Some(self.primary.clone());
        }

        None
    }

    /// 현재 가용 읽기 엔드포인트 집합
    ///
    /// 최상위 프레임이 만료됐으면 격리된 엔드포인트의 복귀를 시도합니다.
    /// 재연결은 락 밖에서 수행되며, 성공하면 프레임을 pop하고 실패하면
    /// 만료를 한 백오프만큼 뒤로 미룹니다.
    async fn available_read_endpoints(&self) -> Vec<EndpointRef> {
        loop {
            let candidate = self.available.lock().expired_quarantined();
            let Some(endpoint) = candidate else {
                return self.available.lock().current().to_vec();
            };

            let healthy = endpoint.reconnect().await.is_ok() && endpoint.is_active().await;

            let mut stack = self.available.lock();
            if healthy {
                debug!(endpoint = endpoint.name(), "read endpoint reinstated");
                stack.reinstate(&endpoint);
                drop(stack);
            } else {
                warn!(
                    endpoint = endpoint.name(),
                    "read endpoint still unhealthy, extending quarantine"
                );
                stack.defer(&endpoint, self.config.replica_quarantine);
                return stack.current().to_vec();
            }
        }
    }

    /// primary 사용 가능 여부
    ///
    /// 억제가 만료됐으면 해제하면서 primary를 강제 disconnect하여 다음
    /// 사용에서 깨끗한 연결로 시작하게 합니다.
    async fn primary_usable(&self) -> bool {
        let expired = self.suppression.lock().take_expired();
        if expired {
            debug!("primary suppression expired, forcing reconnect");
            let _ = self.primary.disconnect().await;
            return true;
        }
        !self.suppression.lock().is_set()
    }

    // ========================================================================
    // 격리 / 억제
    // ========================================================================

    /// 읽기 엔드포인트 격리
    fn quarantine_replica(&self, endpoint: &EndpointRef) {
        let exhausted = {
            let mut stack = self.available.lock();
            let quarantined = stack.quarantine(endpoint, self.config.replica_quarantine);
            if quarantined {
                warn!(
                    endpoint = endpoint.name(),
                    backoff = ?self.config.replica_quarantine,
                    "read endpoint quarantined"
                );
            }
            quarantined && stack.all_unavailable()
        };

        if exhausted && self.suppression.lock().is_suppressed() {
            self.all_down();
        }
    }

    /// primary 억제
    fn suppress_primary(&self) {
        self.suppression.lock().suppress(self.config.primary_suppression);
        warn!(
            endpoint = self.primary.name(),
            backoff = ?self.config.primary_suppression,
            "primary suppressed"
        );

        if self.available.lock().all_unavailable() {
            self.all_down();
        }
    }

    /// 전체 다운 처리
    ///
    /// primary가 억제되고 읽기 집합도 비어 있는 치명 상태입니다. 에러 로그를
    /// 남기고, 설정된 경우 정책 훅을 호출합니다(수퍼바이저 재시작 신호 등).
    fn all_down(&self) {
        error!("all endpoints are down");
        if let Some(hook) = &self.config.all_down_hook {
            hook();
        }
    }

    // ========================================================================
    // 트랜잭션 / primary 강제
    // ========================================================================

    /// 트랜잭션 실행
    ///
    /// 트랜잭션 전체 범위에서 primary 선택을 강제합니다. 바디가 성공하면
    /// 커밋, 에러를 반환하면 롤백 후 바디의 에러를 전파합니다.
    pub async fn transaction<F, Fut, T>(&self, body: F) -> PoolResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PoolResult<T>>,
    {
        SelectionContext::with_primary(async {
            self.dispatch(&Statement::new("begin_db_transaction", "BEGIN")).await?;

            match body().await {
                Ok(value) => {
                    self.dispatch(&Statement::new("commit_db_transaction", "COMMIT")).await?;
                    Ok(value)
                }
                Err(err) => {
                    // 롤백 실패는 바디의 원본 에러를 가리지 않음
                    let _ = self
                        .dispatch(&Statement::new("rollback_db_transaction", "ROLLBACK"))
                        .await;
                    Err(err)
                }
            }
        })
        .await
    }

    /// primary 강제 범위에서 퓨처 실행
    ///
    /// 범위가 끝나면 바깥 컨텍스트가 복원됩니다(에러 경로 포함).
    pub async fn with_primary<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        SelectionContext::with_primary(fut).await
    }

    // ========================================================================
    // 팬아웃
    // ========================================================================

    /// 모든 엔드포인트 재연결
    ///
    /// 격리 여부와 무관하게 primary와 모든 읽기 엔드포인트에 적용합니다.
    /// 읽기 엔드포인트의 실패는 로그만 남기고 삼키며, primary의 실패는
    /// 다시 던집니다.
    pub async fn reconnect_all(&self) -> PoolResult<()> {
        let mut primary_err = None;
        for endpoint in self.all_endpoints() {
            if let Err(err) = endpoint.reconnect().await {
                if endpoint == self.primary {
                    primary_err = Some(err);
                } else {
                    warn!(endpoint = endpoint.name(), error = %err, "reconnect failed on read endpoint");
                }
            }
        }
        match primary_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 모든 엔드포인트 연결 해제
    pub async fn disconnect_all(&self) -> PoolResult<()> {
        let mut primary_err = None;
        for endpoint in self.all_endpoints() {
            if let Err(err) = endpoint.disconnect().await {
                if endpoint == self.primary {
                    primary_err = Some(err);
                } else {
                    warn!(endpoint = endpoint.name(), error = %err, "disconnect failed on read endpoint");
                }
            }
        }
        match primary_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 모든 엔드포인트 상태 초기화
    pub async fn reset_all(&self) -> PoolResult<()> {
        self.cache.clear();
        let mut primary_err = None;
        for endpoint in self.all_endpoints() {
            if let Err(err) = endpoint.reset().await {
                if endpoint == self.primary {
                    primary_err = Some(err);
                } else {
                    warn!(endpoint = endpoint.name(), error = %err, "reset failed on read endpoint");
                }
            }
        }
        match primary_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 모든 엔드포인트 런타임 통계 초기화, 누적 실행 시간 합산 반환
    pub async fn reset_runtime_all(&self) -> PoolResult<Duration> {
        let mut total = Duration::ZERO;
        let mut primary_err = None;
        for endpoint in self.all_endpoints() {
            match endpoint.reset_runtime_stats().await {
                Ok(elapsed) => total += elapsed,
                Err(err) => {
                    if endpoint == self.primary {
                        primary_err = Some(err);
                    } else {
                        warn!(endpoint = endpoint.name(), error = %err, "runtime stats reset failed on read endpoint");
                    }
                }
            }
        }
        match primary_err {
            Some(err) => Err(err),
            None => Ok(total),
        }
    }

    /// 모든 엔드포인트 활성 여부
    pub async fn active_all(&self) -> bool {
        for endpoint in self.all_endpoints() {
            if !endpoint.is_active().await {
                return false;
            }
        }
        true
    }

    // ========================================================================
    // 관측 표면
    // ========================================================================

    /// 엔드포인트의 읽기 가중치
    pub fn pool_weight(&self, endpoint: &EndpointRef) -> usize {
        self.weighted.weight_of(endpoint)
    }

    /// 전체 엔드포인트 목록 (primary 우선)
    pub fn all_endpoints(&self) -> Vec<EndpointRef> {
        let mut endpoints = Vec::with_capacity(1 + self.replicas.len());
        endpoints.push(self.primary.clone());
        endpoints.extend(self.replicas.iter().cloned());
        endpoints
    }

    /// primary 엔드포인트
    pub fn primary(&self) -> &EndpointRef {
        &self.primary
    }

    /// 현재 호출 체인이 primary를 강제 중인지 여부
    pub fn is_using_primary(&self) -> bool {
        SelectionContext::forcing_primary()
    }

    /// 현재 가용 읽기 집합 (가중치 반복 포함)
    pub fn current_read_set(&self) -> Vec<EndpointRef> {
        self.available.lock().current().to_vec()
    }

    /// 가용성 스택 깊이
    pub fn stack_depth(&self) -> usize {
        self.available.lock().depth()
    }

    /// primary 억제 중 여부
    pub fn primary_suppressed(&self) -> bool {
        self.suppression.lock().is_suppressed()
    }

    /// 쿼리 캐시
    pub fn query_cache(&self) -> &QueryCache {
        &self.cache
    }

    /// 라우터 설정
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// 라우터 상태 스냅샷
    pub fn metrics(&self) -> RouterMetrics {
        let (read_set_size, stack_depth) = {
            let stack = self.available.lock();
            (stack.current().len(), stack.depth())
        };
        RouterMetrics {
            endpoints: 1 + self.replicas.len(),
            read_set_size,
            stack_depth,
            primary_suppressed: self.primary_suppressed(),
            cached_queries: self.cache.len(),
        }
    }
}

impl fmt::Display for PoolRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoolRouter(primary={}, reads={})",
            self.primary.name(),
            self.replicas.len()
        )
    }
}

impl fmt::Debug for PoolRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRouter")
            .field("primary", &self.primary)
            .field("replicas", &self.replicas)
            .field("stack_depth", &self.stack_depth())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
