//! Dispatch Observer
//!
//! 디스패치 관측 콜백

use tracing::{debug, warn};

// ============================================================================
// DispatchOutcome - 디스패치 결과
// ============================================================================

/// 디스패치 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 성공
    Success,
    /// 같은 엔드포인트에서 재연결 후 재시도하여 성공
    Retried,
    /// 실패
    Failed,
}

// ============================================================================
// DispatchObserver - 관측 인터페이스
// ============================================================================

/// 디스패치 관측 인터페이스
///
/// 라우터는 매 디스패치마다 (엔드포인트 이름, 오퍼레이션, 결과)로 이
/// 콜백을 호출합니다. 구체적인 로그 싱크는 외부 협력자입니다.
pub trait DispatchObserver: Send + Sync {
    /// 디스패치 결과 통지
    fn on_dispatch(&self, endpoint: &str, operation: &str, outcome: DispatchOutcome);
}

// ============================================================================
// TracingObserver - 기본 구현
// ============================================================================

/// tracing 기반 기본 관측자
#[derive(Debug, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn on_dispatch(&self, endpoint: &str, operation: &str, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Success => {
                debug!(endpoint, operation, "dispatch succeeded");
            }
            DispatchOutcome::Retried => {
                debug!(endpoint, operation, "dispatch succeeded after reconnect");
            }
            DispatchOutcome::Failed => {
                warn!(endpoint, operation, "dispatch failed");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// 호출 기록용 관측자
    #[derive(Default)]
    struct RecordingObserver {
        calls: Mutex<Vec<(String, String, DispatchOutcome)>>,
    }

    impl DispatchObserver for RecordingObserver {
        fn on_dispatch(&self, endpoint: &str, operation: &str, outcome: DispatchOutcome) {
            self.calls
                .lock()
                .push((endpoint.to_string(), operation.to_string(), outcome));
        }
    }

    #[test]
    fn test_observer_receives_outcomes() {
        let observer = Arc::new(RecordingObserver::default());

        observer.on_dispatch("replica-1", "select", DispatchOutcome::Success);
        observer.on_dispatch("primary", "insert", DispatchOutcome::Failed);

        let calls = observer.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            ("replica-1".to_string(), "select".to_string(), DispatchOutcome::Success)
        );
        assert_eq!(
            calls[1],
            ("primary".to_string(), "insert".to_string(), DispatchOutcome::Failed)
        );
    }

    #[test]
    fn test_tracing_observer_does_not_panic() {
        let observer = TracingObserver;
        observer.on_dispatch("replica-1", "select", DispatchOutcome::Success);
        observer.on_dispatch("replica-1", "select", DispatchOutcome::Retried);
        observer.on_dispatch("replica-1", "select", DispatchOutcome::Failed);
    }
}
