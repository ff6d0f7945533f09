//! Availability Bookkeeping
//!
//! 읽기 엔드포인트 가용성 스택과 primary 억제 상태

use std::time::{Duration, Instant};

use crate::endpoint::EndpointRef;

// ============================================================================
// AvailabilityFrame - 가용성 프레임
// ============================================================================

/// 가용성 프레임
///
/// 기반 프레임(스택 바닥)은 만료 없이 전체 가중치 집합을 담습니다. 그 위에
/// 쌓이는 프레임은 "전체 집합에서 격리된 엔드포인트 하나를 뺀 집합, 만료
/// 시각까지"를 나타냅니다.
#[derive(Debug, Clone)]
pub struct AvailabilityFrame {
    /// 가용 엔드포인트 집합 (가중치 반복 포함)
    endpoints: Vec<EndpointRef>,
    /// 격리된 엔드포인트
    quarantined: Option<EndpointRef>,
    /// 만료 시각 (None이면 만료 없음)
    expires_at: Option<Instant>,
}

impl AvailabilityFrame {
    /// 기반 프레임 생성
    fn base(endpoints: Vec<EndpointRef>) -> Self {
        Self {
            endpoints,
            quarantined: None,
            expires_at: None,
        }
    }

    /// 격리 프레임 생성
    fn quarantined(endpoints: Vec<EndpointRef>, failed: EndpointRef, backoff: Duration) -> Self {
        Self {
            endpoints,
            quarantined: Some(failed),
            expires_at: Some(Instant::now() + backoff),
        }
    }

    /// 만료 여부
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= Instant::now(),
            None => false,
        }
    }

    /// 가용 엔드포인트 집합
    pub fn endpoints(&self) -> &[EndpointRef] {
        &self.endpoints
    }

    /// 격리된 엔드포인트
    pub fn quarantined_endpoint(&self) -> Option<&EndpointRef> {
        self.quarantined.as_ref()
    }
}

// ============================================================================
// AvailabilityStack - 가용성 스택
// ============================================================================

/// 가용성 스택
///
/// 비어 있지 않은 프레임 LIFO 스택입니다. 격리 시 push, 재연결 성공 시 pop,
/// 재연결 실패 시 만료 연장만 일어납니다. 라우터 인스턴스당 하나 생성되며
/// 라우터와 수명을 같이합니다. 만료 검사는 읽기 시점에 지연 수행되며 백그라운드
/// 타이머는 없습니다.
#[derive(Debug)]
pub struct AvailabilityStack {
    frames: Vec<AvailabilityFrame>,
}

impl AvailabilityStack {
    /// 가중치 집합으로 스택 생성
    pub fn new(weighted: Vec<EndpointRef>) -> Self {
        Self {
            frames: vec![AvailabilityFrame::base(weighted)],
        }
    }

    /// 현재 가용 엔드포인트 집합 (최상위 프레임)
    pub fn current(&self) -> &[EndpointRef] {
        self.top().endpoints()
    }

    /// 스택 깊이
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 최상위 프레임
    pub fn top(&self) -> &AvailabilityFrame {
        // 스택은 비어 있지 않음 (기반 프레임은 pop되지 않음)
        self.frames.last().expect("availability stack is never empty")
    }

    /// 만료된 최상위 프레임의 격리 엔드포인트
    ///
    /// 복귀 시도가 필요한 엔드포인트를 반환합니다. 실제 재연결은 락 밖에서
    /// 수행한 뒤 `reinstate` 또는 `defer`로 반영합니다.
    pub fn expired_quarantined(&self) -> Option<EndpointRef> {
        let top = self.top();
        if top.is_expired() {
            top.quarantined_endpoint().cloned()
        } else {
            None
        }
    }

    /// 격리 해제
    ///
    /// 최상위 프레임이 해당 엔드포인트를 격리 중이면 pop합니다. 그 아래
    /// 프레임은 이미 이 엔드포인트를 포함합니다. 기반 프레임은 pop되지
    /// 않습니다.
    pub fn reinstate(&mut self, endpoint: &EndpointRef) -> bool {
        if self.frames.len() > 1 && self.top().quarantined_endpoint() == Some(endpoint) {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// 격리 연장
    ///
    /// 재연결에 실패한 엔드포인트의 만료를 뒤로 미룹니다.
    pub fn defer(&mut self, endpoint: &EndpointRef, backoff: Duration) {
        if let Some(top) = self.frames.last_mut() {
            if top.quarantined.as_ref() == Some(endpoint) {
                top.expires_at = Some(Instant::now() + backoff);
            }
        }
    }

    /// 엔드포인트 격리
    ///
    /// 현재 집합에 없는 엔드포인트는 no-op입니다. 이미 격리됐거나 멤버가
    /// 아니었던 엔드포인트에 대해 반복 호출해도 스택은 자라지 않습니다.
    pub fn quarantine(&mut self, endpoint: &EndpointRef, backoff: Duration) -> bool {
        let current = self.current();
        if !current.contains(endpoint) {
            return false;
        }

        let remaining: Vec<EndpointRef> =
            current.iter().filter(|e| *e != endpoint).cloned().collect();
        self.frames.push(AvailabilityFrame::quarantined(
            remaining,
            endpoint.clone(),
            backoff,
        ));
        true
    }

    /// 모든 읽기 엔드포인트 사용 불가 여부
    ///
    /// 격리로 인해 집합이 비었고 최상위 프레임이 아직 만료되지 않았으면
    /// true입니다. 읽기 엔드포인트가 아예 설정되지 않은 기반 프레임은
    /// 격리 상태가 아니므로 해당하지 않습니다.
    pub fn all_unavailable(&self) -> bool {
        let top = self.top();
        self.frames.len() > 1 && !top.is_expired() && top.endpoints().is_empty()
    }
}

// ============================================================================
// PrimarySuppression - primary 억제 상태
// ============================================================================

/// primary 억제 상태
///
/// `None`이면 primary 사용 가능. primary 장애 시 설정되며, 읽기 시점에
/// 만료가 지연 확인됩니다.
#[derive(Debug, Default)]
pub struct PrimarySuppression {
    expires_at: Option<Instant>,
}

impl PrimarySuppression {
    /// 새 억제 상태 생성 (억제 없음)
    pub fn new() -> Self {
        Self::default()
    }

    /// primary 억제
    pub fn suppress(&mut self, duration: Duration) {
        self.expires_at = Some(Instant::now() + duration);
    }

    /// 억제 설정 여부 (만료 여부 무관)
    pub fn is_set(&self) -> bool {
        self.expires_at.is_some()
    }

    /// 현재 억제 중 여부
    pub fn is_suppressed(&self) -> bool {
        match self.expires_at {
            Some(at) => at > Instant::now(),
            None => false,
        }
    }

    /// 만료된 억제 해제
    ///
    /// 만료됐으면 해제하고 true를 반환합니다. 호출자는 다음 사용에서 깨끗하게
    /// 재연결되도록 primary를 강제로 disconnect해야 합니다.
    pub fn take_expired(&mut self) -> bool {
        match self.expires_at {
            Some(at) if at <= Instant::now() => {
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolResult;
    use crate::statement::{Statement, StatementResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubEndpoint {
        name: String,
    }

    #[async_trait]
    impl crate::endpoint::EndpointPool for StubEndpoint {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self, _stmt: &Statement) -> PoolResult<StatementResult> {
            Ok(StatementResult::Unit)
        }

        async fn reconnect(&self) -> PoolResult<()> {
            Ok(())
        }

        async fn disconnect(&self) -> PoolResult<()> {
            Ok(())
        }

        async fn is_active(&self) -> bool {
            true
        }

        async fn reset(&self) -> PoolResult<()> {
            Ok(())
        }

        async fn reset_runtime_stats(&self) -> PoolResult<std::time::Duration> {
            Ok(std::time::Duration::ZERO)
        }
    }

    fn endpoint(name: &str) -> EndpointRef {
        EndpointRef::new(Arc::new(StubEndpoint {
            name: name.to_string(),
        }))
    }

    const BACKOFF: Duration = Duration::from_secs(30);

    #[test]
    fn test_quarantine_pushes_one_frame() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone(), b.clone()]);

        assert_eq!(stack.depth(), 1);
        assert!(stack.quarantine(&a, BACKOFF));
        assert_eq!(stack.depth(), 2);
        assert!(!stack.current().contains(&a));
        // 가중치 반복은 유지됨
        assert_eq!(stack.current().len(), 2);
    }

    #[test]
    fn test_quarantine_absent_endpoint_is_noop() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone()]);

        stack.quarantine(&a, BACKOFF);
        assert_eq!(stack.depth(), 2);

        // 이미 격리된 엔드포인트의 반복 격리는 스택을 키우지 않음
        assert!(!stack.quarantine(&a, BACKOFF));
        assert_eq!(stack.depth(), 2);
        assert!(!stack.quarantine(&a, BACKOFF));
        assert_eq!(stack.depth(), 2);

        // 멤버였던 적 없는 엔드포인트도 no-op
        let stranger = endpoint("stranger");
        assert!(!stack.quarantine(&stranger, BACKOFF));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_quarantine_removes_all_weighted_occurrences() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone(), b.clone()]);

        stack.quarantine(&b, BACKOFF);
        assert_eq!(stack.current(), &[a.clone()]);
    }

    #[test]
    fn test_expired_quarantined_after_backoff() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone()]);

        stack.quarantine(&a, Duration::ZERO);
        assert_eq!(stack.expired_quarantined(), Some(a.clone()));
    }

    #[test]
    fn test_expired_quarantined_before_backoff() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone()]);

        stack.quarantine(&a, BACKOFF);
        assert_eq!(stack.expired_quarantined(), None);

        // 기반 프레임은 만료되지 않음
        let fresh = AvailabilityStack::new(vec![a, b]);
        assert_eq!(fresh.expired_quarantined(), None);
    }

    #[test]
    fn test_reinstate_pops_frame() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone()]);

        stack.quarantine(&a, Duration::ZERO);
        assert!(stack.reinstate(&a));
        assert_eq!(stack.depth(), 1);
        assert!(stack.current().contains(&a));
    }

    #[test]
    fn test_reinstate_never_pops_base_frame() {
        let a = endpoint("a");
        let mut stack = AvailabilityStack::new(vec![a.clone()]);

        assert!(!stack.reinstate(&a));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_defer_pushes_expiry_forward() {
        let (a, b) = (endpoint("a"), endpoint("b"));
        let mut stack = AvailabilityStack::new(vec![a.clone(), b.clone()]);

        stack.quarantine(&a, Duration::ZERO);
        assert_eq!(stack.expired_quarantined(), Some(a.clone()));

        stack.defer(&a, BACKOFF);
        assert_eq!(stack.expired_quarantined(), None);
        assert_eq!(stack.depth(), 2);
        assert!(!stack.current().contains(&a));
    }

    #[test]
    fn test_all_unavailable() {
        let a = endpoint("a");
        let mut stack = AvailabilityStack::new(vec![a.clone()]);

        assert!(!stack.all_unavailable());
        stack.quarantine(&a, BACKOFF);
        assert!(stack.all_unavailable());
    }

    #[test]
    fn test_all_unavailable_false_when_expired() {
        let a = endpoint("a");
        let mut stack = AvailabilityStack::new(vec![a.clone()]);

        stack.quarantine(&a, Duration::ZERO);
        // 만료된 프레임은 복귀 시도 대상이므로 전체 다운으로 보지 않음
        assert!(!stack.all_unavailable());
    }

    #[test]
    fn test_all_unavailable_ignores_empty_base_frame() {
        // 읽기 엔드포인트 미설정은 격리가 아님
        let stack = AvailabilityStack::new(Vec::new());
        assert!(!stack.all_unavailable());
    }

    #[test]
    fn test_primary_suppression_lifecycle() {
        let mut suppression = PrimarySuppression::new();

        assert!(!suppression.is_set());
        assert!(!suppression.is_suppressed());
        assert!(!suppression.take_expired());

        suppression.suppress(Duration::from_secs(30));
        assert!(suppression.is_set());
        assert!(suppression.is_suppressed());
        assert!(!suppression.take_expired());

        suppression.suppress(Duration::ZERO);
        assert!(!suppression.is_suppressed());
        assert!(suppression.take_expired());
        assert!(!suppression.is_set());
    }
}
