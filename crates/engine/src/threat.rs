//! 위협 탐지기 -- 호스트별 후행 윈도우 버스트 탐지
//!
//! 실패형 이벤트(Auth Failure, Illegal Access, CRITICAL)를 원격 호스트로
//! 묶고, 각 이벤트 시각에서 끝나는 후행 윈도우(기본 10분)의 동일 호스트
//! 실패 수를 셉니다. 어느 윈도우든 임계값(기본 5)에 도달하면 그 호스트는
//! 후보가 됩니다.
//!
//! 하나의 필드에 여러 주소가 함께 들어 있으면(IP + 도메인) 복합 문자열
//! 전체를 하나의 그룹 키로 씁니다. 쪼개서 일부만 집계하는 일은 없습니다.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use logsmith_core::config::ThreatConfig;
use logsmith_core::types::{LogRecord, SecurityTag, Severity, ThreatCandidate};

/// 실패형 레코드 판정
///
/// Auth Failure 태그, Illegal Access 태그, CRITICAL 심각도 중 하나면
/// 실패로 칩니다.
pub fn is_failure(record: &LogRecord) -> bool {
    record.security_tags.contains(&SecurityTag::AuthFailure)
        || record.security_tags.contains(&SecurityTag::IllegalAccess)
        || record.severity == Severity::Critical
}

/// 위협 탐지기
pub struct ThreatDetector {
    config: ThreatConfig,
}

impl ThreatDetector {
    /// 새 탐지기를 생성합니다.
    pub fn new(config: ThreatConfig) -> Self {
        Self { config }
    }

    /// 전체 레코드에서 무차별 대입 후보 호스트를 찾습니다.
    ///
    /// 타임스탬프가 없거나 호스트 식별이 없는 실패는 윈도우 집계에
    /// 넣을 수 없으므로 제외됩니다. 결과는 버스트 레이트 내림차순입니다.
    pub fn scan(&self, records: &[LogRecord]) -> Vec<ThreatCandidate> {
        let mut by_host: HashMap<String, Vec<NaiveDateTime>> = HashMap::new();
        let mut host_order: Vec<String> = Vec::new();

        for record in records {
            if !is_failure(record) {
                continue;
            }
            let Some(ts) = record.timestamp else { continue };
            let Some(host) = record.remote_host.as_ref() else {
                continue;
            };
            if host.is_empty() {
                continue;
            }
            if !by_host.contains_key(host) {
                host_order.push(host.clone());
            }
            by_host.entry(host.clone()).or_default().push(ts);
        }

        let window = Duration::minutes(self.config.window_minutes as i64);
        let threshold = self.config.max_retry;
        let mut candidates = Vec::new();

        for host in &host_order {
            let Some(times) = by_host.get_mut(host) else {
                continue;
            };
            times.sort_unstable();

            // 투 포인터 후행 윈도우: 각 이벤트 t에 대해 (t - window, t] 카운트
            let mut start = 0usize;
            let mut max_burst = 0u64;
            let mut triggered_at: Option<NaiveDateTime> = None;
            for (i, &t) in times.iter().enumerate() {
                while times[start] <= t - window {
                    start += 1;
                }
                let count = (i - start + 1) as u64;
                if count > max_burst {
                    max_burst = count;
                }
                if count >= threshold && triggered_at.is_none() {
                    triggered_at = Some(t);
                }
            }

            if let Some(at) = triggered_at {
                tracing::info!(host = %host, max_burst, "threat candidate flagged");
                candidates.push(ThreatCandidate {
                    host: host.clone(),
                    triggered_at: at,
                    max_burst,
                    total_failures: times.len() as u64,
                });
            }
        }

        // 버스트 내림차순, 동률은 먼저 트리거된 순
        candidates.sort_by(|a, b| {
            b.max_burst
                .cmp(&a.max_burst)
                .then(a.triggered_at.cmp(&b.triggered_at))
        });
        candidates
    }
}
