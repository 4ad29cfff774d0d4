//! 분석 산출물 타입 -- 리포팅 레이어가 소비하는 결정적 아티팩트

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use logsmith_core::types::{LogRecord, Session, TemplateCluster, ThreatCandidate};

/// 실행 통계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// 비어 있지 않은 입력 줄 수
    pub total_lines: usize,
    /// 레코드로 분석된 줄 수
    pub analyzed: usize,
    /// 노이즈 프리필터로 제외된 줄 수
    pub noise_filtered: usize,
    /// 고유 템플릿 수
    pub unique_templates: usize,
    /// 적용된 앵커 연도
    pub anchor_year: i32,
    /// 앵커 연도를 로그에서 찾았는지
    pub anchor_from_logs: bool,
    /// 연도 롤오버 보정 여부
    pub rollover_detected: bool,
    /// 타임스탬프 해석 실패 레코드 수
    pub unresolved_timestamps: usize,
    /// 버려진 짝 없는 LOGOUT 수
    pub orphan_logouts: u64,
}

/// (user, service) 단위 세션 그룹
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGroup {
    /// 사용자명
    pub user: String,
    /// 서비스명
    pub service: String,
    /// 그룹 내 세션 수
    pub count: usize,
    /// 시작 시각 오름차순 세션 목록
    pub sessions: Vec<Session>,
}

/// 세션을 (user, service)로 묶습니다.
///
/// 그룹은 최초 등장 순서, 그룹 안은 시작 시각 오름차순입니다.
/// 정렬은 리포팅 전용이며 상관 로직은 파일 순서로 이미 끝난 뒤입니다.
pub fn group_sessions(sessions: Vec<Session>) -> Vec<SessionGroup> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut map: HashMap<(String, String), Vec<Session>> = HashMap::new();
    for session in sessions {
        let key = (session.user.clone(), session.service.clone());
        if !map.contains_key(&key) {
            order.push(key.clone());
        }
        map.entry(key).or_default().push(session);
    }
    order
        .into_iter()
        .map(|key| {
            let mut sessions = map.remove(&key).unwrap_or_default();
            sessions.sort_by_key(|s| s.start);
            SessionGroup {
                user: key.0,
                service: key.1,
                count: sessions.len(),
                sessions,
            }
        })
        .collect()
}

/// 전체 분석 산출물
///
/// 다운스트림(리포트/LLM 설명 -- 범위 밖)은 이 값을 읽기만 하고
/// 변경하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// 실행 통계
    pub stats: AnalysisStats,
    /// 파일 순서의 구조화 레코드
    pub records: Vec<LogRecord>,
    /// 발생 수 내림차순 클러스터 집계
    pub clusters: Vec<TemplateCluster>,
    /// (user, service) 세션 그룹
    pub sessions: Vec<SessionGroup>,
    /// 버스트 내림차순 위협 후보
    pub threats: Vec<ThreatCandidate>,
}
