//! Endpoint Pool Interface
//!
//! 물리 엔드포인트 추상화와 엔드포인트 핸들

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PoolResult;
use crate::statement::{Statement, StatementResult};

// ============================================================================
// EndpointPool - 엔드포인트 풀 인터페이스
// ============================================================================

/// 하나의 물리 데이터베이스 인스턴스에 대한 연결 풀
///
/// 실제 소켓/인증 관리는 구현체의 책임입니다. 라우터는 이 인터페이스를
/// 통해서만 엔드포인트를 다룹니다.
#[async_trait]
pub trait EndpointPool: Send + Sync {
    /// 엔드포인트 이름 (로깅/관측용)
    fn name(&self) -> &str;

    /// 스테이트먼트 실행
    async fn execute(&self, stmt: &Statement) -> PoolResult<StatementResult>;

    /// 재연결
    async fn reconnect(&self) -> PoolResult<()>;

    /// 연결 해제
    async fn disconnect(&self) -> PoolResult<()>;

    /// 활성 상태 확인
    async fn is_active(&self) -> bool;

    /// 연결 상태 초기화
    async fn reset(&self) -> PoolResult<()>;

    /// 런타임 통계 초기화, 누적 실행 시간 반환
    async fn reset_runtime_stats(&self) -> PoolResult<Duration>;
}

// ============================================================================
// EndpointRef - 엔드포인트 핸들
// ============================================================================

/// 엔드포인트 핸들
///
/// 동일성은 참조 동일성입니다. 같은 풀을 가리키는 두 핸들은 같고,
/// 맵/셋 키로 사용됩니다. 코어는 핸들을 생성하지 않으며 생성 시점에
/// 공급받습니다.
#[derive(Clone)]
pub struct EndpointRef(Arc<dyn EndpointPool>);

impl EndpointRef {
    /// 새 핸들 생성
    pub fn new(pool: Arc<dyn EndpointPool>) -> Self {
        Self(pool)
    }

    /// 엔드포인트 이름
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// 내부 풀 참조
    pub fn pool(&self) -> &Arc<dyn EndpointPool> {
        &self.0
    }
}

impl std::ops::Deref for EndpointRef {
    type Target = dyn EndpointPool;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for EndpointRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EndpointRef {}

impl Hash for EndpointRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0).cast::<u8>() as usize).hash(state);
    }
}

impl fmt::Debug for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointRef").field(&self.name()).finish()
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct StubEndpoint {
        name: String,
    }

    #[async_trait]
    impl EndpointPool for StubEndpoint {
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

        async fn reset_runtime_stats(&self) -> PoolResult<Duration> {
            Ok(Duration::ZERO)
        }
    }

    fn endpoint(name: &str) -> EndpointRef {
        EndpointRef::new(Arc::new(StubEndpoint {
            name: name.to_string(),
        }))
    }

    #[test]
    fn test_endpoint_ref_identity() {
        let a = endpoint("db1");
        let b = endpoint("db1");

        // 이름이 같아도 다른 풀이면 다른 핸들
        assert_ne!(a, b);
        // 클론은 같은 풀을 가리킴
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_endpoint_ref_as_set_key() {
        let a = endpoint("db1");
        let b = endpoint("db2");

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(b.clone());

        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
        assert!(set.contains(&b));
    }

    #[test]
    fn test_endpoint_ref_debug_and_display() {
        let a = endpoint("replica-1");
        assert_eq!(a.to_string(), "replica-1");
        assert!(format!("{:?}", a).contains("replica-1"));
    }
}
