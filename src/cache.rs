//! Query Cache
//!
//! 읽기 결과 캐시

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::statement::StatementResult;

// ============================================================================
// QueryCache - 쿼리 캐시
// ============================================================================

/// 읽기 결과 캐시
///
/// 읽기 결과를 캐시 키로 저장하고, 쓰기 디스패치 시 전체를 비웁니다.
/// 끈 상태에서는 fetch/store 모두 no-op입니다.
#[derive(Debug)]
pub struct QueryCache {
    enabled: AtomicBool,
    entries: Mutex<HashMap<String, StatementResult>>,
}

impl QueryCache {
    /// 새 캐시 생성
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 캐시 활성화
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// 캐시 비활성화 및 비우기
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        self.entries.lock().clear();
    }

    /// 활성화 여부
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// 캐시 조회
    pub fn fetch(&self, key: &str) -> Option<StatementResult> {
        if !self.is_enabled() {
            return None;
        }
        self.entries.lock().get(key).cloned()
    }

    /// 결과 저장
    pub fn store(&self, key: String, result: StatementResult) {
        if !self.is_enabled() {
            return;
        }
        self.entries.lock().insert(key, result);
    }

    /// 전체 비우기
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// 저장된 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 빈 캐시 여부
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_fetch() {
        let cache = QueryCache::new(true);

        cache.store("select 1".to_string(), StatementResult::Count(1));
        assert_eq!(cache.fetch("select 1"), Some(StatementResult::Count(1)));
        assert_eq!(cache.fetch("select 2"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_disabled_cache_is_noop() {
        let cache = QueryCache::new(false);

        cache.store("select 1".to_string(), StatementResult::Count(1));
        assert!(cache.is_empty());
        assert_eq!(cache.fetch("select 1"), None);
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new(true);

        cache.store("a".to_string(), StatementResult::Unit);
        cache.store("b".to_string(), StatementResult::Unit);
        cache.clear();

        assert!(cache.is_empty());
    }

    #[test]
    fn test_disable_clears_entries() {
        let cache = QueryCache::new(true);

        cache.store("a".to_string(), StatementResult::Unit);
        cache.disable();

        assert!(!cache.is_enabled());
        assert!(cache.is_empty());

        // 재활성화하면 다시 저장 가능
        cache.enable();
        cache.store("a".to_string(), StatementResult::Unit);
        assert_eq!(cache.len(), 1);
    }
}
