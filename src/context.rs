//! Selection Context
//!
//! 호출 체인 범위의 엔드포인트 선택 상태

use std::cell::RefCell;
use std::future::Future;

use crate::endpoint::EndpointRef;

tokio::task_local! {
    /// 현재 태스크 체인의 선택 상태
    static SELECTION: RefCell<SelectionState>;
}

// ============================================================================
// SelectionState - 선택 상태
// ============================================================================

/// 호출 체인 범위 선택 상태
///
/// 태스크 로컬로 전파되며, 같은 체인 안의 중첩 호출이 공유합니다.
/// 다른 체인과는 완전히 격리됩니다.
#[derive(Debug, Clone, Default)]
struct SelectionState {
    /// primary 강제 여부
    force_primary: bool,
    /// 고정된 읽기 엔드포인트
    pinned: Option<EndpointRef>,
}

// ============================================================================
// SelectionContext - 선택 컨텍스트
// ============================================================================

/// 선택 컨텍스트 진입점
///
/// 모든 메서드는 컨텍스트 밖에서 호출해도 안전합니다. 읽기는 기본값을
/// 반환하고 쓰기는 no-op입니다.
pub struct SelectionContext;

impl SelectionContext {
    /// 새 선택 컨텍스트에서 퓨처 실행
    ///
    /// 요청 단위 경계입니다. 컨텍스트 안에서 고정한 엔드포인트와 primary
    /// 강제 플래그는 퓨처 종료와 함께 사라집니다.
    pub async fn scope<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        SELECTION.scope(RefCell::new(SelectionState::default()), fut).await
    }

    /// primary 강제 범위에서 퓨처 실행
    ///
    /// 바깥 컨텍스트의 상태를 복사해 primary 강제 플래그만 켠 중첩 범위를
    /// 만듭니다. 퓨처가 정상 종료하든 에러로 종료하든 바깥 상태는 그대로
    /// 유지됩니다.
    pub async fn with_primary<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        let mut state = Self::snapshot();
        state.force_primary = true;
        SELECTION.scope(RefCell::new(state), fut).await
    }

    /// primary 강제 여부
    pub fn forcing_primary() -> bool {
        SELECTION
            .try_with(|state| state.borrow().force_primary)
            .unwrap_or(false)
    }

    /// 고정된 읽기 엔드포인트
    pub fn pinned() -> Option<EndpointRef> {
        SELECTION
            .try_with(|state| state.borrow().pinned.clone())
            .unwrap_or(None)
    }

    /// 읽기 엔드포인트 고정
    pub fn pin(endpoint: EndpointRef) {
        let _ = SELECTION.try_with(|state| {
            state.borrow_mut().pinned = Some(endpoint);
        });
    }

    /// 고정 해제
    pub fn clear_pin() {
        let _ = SELECTION.try_with(|state| {
            state.borrow_mut().pinned = None;
        });
    }

    /// 현재 상태 스냅샷 (컨텍스트 밖이면 기본값)
    fn snapshot() -> SelectionState {
        SELECTION
            .try_with(|state| state.borrow().clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
