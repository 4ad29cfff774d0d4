//! 기본 템플릿 마이너 -- 토큰 병합 방식의 경량 구현
//!
//! [`TokenMergeMiner`]는 core의 [`TemplateMiner`] trait에 대한 기본 구현입니다.
//! 정규화된 줄을 토큰 수와 선두 토큰으로 버킷팅한 뒤, 토큰 단위 유사도가
//! 임계값 이상인 기존 클러스터에 병합하고 서로 다른 위치를 `<*>`
//! 와일드카드로 일반화합니다.
//!
//! 증분 prefix-tree 엔진의 대체재가 아니라 실행 가능한 기본값입니다.
//! 본격적인 클러스터링 엔진은 trait 구현으로 주입합니다.

use std::collections::HashMap;

use logsmith_core::error::LogsmithError;
use logsmith_core::pipeline::TemplateMiner;
use logsmith_core::types::{MinedTemplate, TemplateCluster};

/// 와일드카드 토큰
pub const WILDCARD: &str = "<*>";

struct ClusterState {
    cluster_id: u64,
    tokens: Vec<String>,
    occurrences: u64,
}

impl ClusterState {
    fn template(&self) -> String {
        self.tokens.join(" ")
    }
}

/// 토큰 병합 마이너
///
/// 상태는 삽입 순서에 의존합니다. 같은 입력을 같은 순서로 넣으면
/// 같은 클러스터 id가 나옵니다 (id는 1부터 시작).
pub struct TokenMergeMiner {
    /// 병합 판정 유사도 임계값 (0 초과 1 이하)
    similarity: f64,
    /// (토큰 수, 선두 토큰) → 후보 클러스터 인덱스
    buckets: HashMap<(usize, String), Vec<usize>>,
    clusters: Vec<ClusterState>,
}

impl TokenMergeMiner {
    /// 주어진 유사도 임계값으로 마이너를 생성합니다.
    pub fn new(similarity: f64) -> Self {
        Self {
            similarity,
            buckets: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    /// 기존 클러스터와 신규 토큰열의 유사도를 계산합니다.
    ///
    /// 위치별로 토큰이 같거나 기존 쪽이 와일드카드면 일치로 셉니다.
    fn similarity_of(existing: &[String], tokens: &[&str]) -> f64 {
        if existing.is_empty() {
            return 1.0;
        }
        let mut matched = 0usize;
        for (have, incoming) in existing.iter().zip(tokens) {
            if have.as_str() == WILDCARD || have.as_str() == *incoming {
                matched += 1;
            }
        }
        matched as f64 / existing.len() as f64
    }
}

impl TemplateMiner for TokenMergeMiner {
    fn name(&self) -> &str {
        "token-merge"
    }

    fn mine(&mut self, normalized: &str) -> Result<MinedTemplate, LogsmithError> {
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        let first = tokens.first().copied().unwrap_or_default().to_owned();
        let key = (tokens.len(), first);

        let candidates = self.buckets.entry(key).or_default();
        for &idx in candidates.iter() {
            let cluster = &self.clusters[idx];
            if Self::similarity_of(&cluster.tokens, &tokens) >= self.similarity {
                let cluster = &mut self.clusters[idx];
                for (have, incoming) in cluster.tokens.iter_mut().zip(&tokens) {
                    if have.as_str() != *incoming && have.as_str() != WILDCARD {
                        *have = WILDCARD.to_owned();
                    }
                }
                cluster.occurrences += 1;
                return Ok(MinedTemplate {
                    cluster_id: cluster.cluster_id,
                    template: cluster.template(),
                });
            }
        }

        let cluster_id = self.clusters.len() as u64 + 1;
        let state = ClusterState {
            cluster_id,
            tokens: tokens.iter().map(|t| (*t).to_owned()).collect(),
            occurrences: 1,
        };
        let template = state.template();
        candidates.push(self.clusters.len());
        self.clusters.push(state);
        tracing::debug!(cluster_id, template = %template, "new template cluster");
        Ok(MinedTemplate {
            cluster_id,
            template,
        })
    }

    fn clusters(&self) -> Vec<TemplateCluster> {
        self.clusters
            .iter()
            .map(|c| TemplateCluster {
                cluster_id: c.cluster_id,
                template: c.template(),
                occurrences: c.occurrences,
            })
            .collect()
    }
}
