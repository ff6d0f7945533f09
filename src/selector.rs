//! Weighted Selector
//!
//! 가중치 기반 읽기 엔드포인트 선택

use std::collections::HashMap;

use crate::endpoint::EndpointRef;

// ============================================================================
// WeightedEndpointSet - 가중치 엔드포인트 집합
// ============================================================================

/// 가중치 엔드포인트 집합
///
/// 각 엔드포인트를 가중치만큼 반복한 시퀀스입니다. 가중치 0인 엔드포인트는
/// 완전히 제외됩니다. 생성 후 불변이며, `len() == 가중치 합`이 항상
/// 성립합니다.
#[derive(Debug, Clone, Default)]
pub struct WeightedEndpointSet {
    /// 가중치만큼 반복된 엔드포인트 목록
    entries: Vec<EndpointRef>,
}

impl WeightedEndpointSet {
    /// 가중치 맵으로 집합 생성
    ///
    /// 맵에 없는 엔드포인트의 가중치는 1입니다.
    pub fn build(endpoints: &[EndpointRef], weights: &HashMap<EndpointRef, u32>) -> Self {
        let mut entries = Vec::new();
        for endpoint in endpoints {
            let weight = weights.get(endpoint).copied().unwrap_or(1);
            for _ in 0..weight {
                entries.push(endpoint.clone());
            }
        }
        Self { entries }
    }

    /// 가중치 인코딩된 엔드포인트 목록
    pub fn entries(&self) -> &[EndpointRef] {
        &self.entries
    }

    /// 집합 크기 (가중치 합)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 빈 집합 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 엔드포인트의 가중치 (목록 내 등장 횟수)
    pub fn weight_of(&self, endpoint: &EndpointRef) -> usize {
        self.entries.iter().filter(|e| *e == endpoint).count()
    }

    /// 후보 목록에서 균등 랜덤 선택
    ///
    /// 후보 시퀀스가 이미 가중치를 반복으로 인코딩하고 있으므로 균등 선택이
    /// 곧 가중치 선택입니다. 빈 목록이면 `None`을 반환하며 호출자가
    /// 백업/primary 폴백을 처리해야 합니다.
    pub fn pick(candidates: &[EndpointRef]) -> Option<EndpointRef> {
        if candidates.is_empty() {
            return None;
        }

        use rand::Rng;
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
