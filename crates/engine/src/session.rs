//! 세션 상관기 -- 스택 기반 LIFO 로그인/로그아웃 매칭
//!
//! 레코드는 **원본 파일 순서**로 들어와야 합니다. 타임스탬프 파싱은
//! 실패할 수 있으므로 파일 순서가 신뢰할 수 있는 시간 순서 근사입니다.
//!
//! LOGOUT은 같은 식별 키의 가장 최근 미매칭 LOGIN만 닫습니다 (LIFO).
//! 짝 없는 LOGOUT은 조용히 버려지며 소급 매칭하지 않습니다.
//! 스트림 종료 시 열려 있는 세션은 Active 또는 Stale이 됩니다.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use logsmith_core::config::SessionConfig;
use logsmith_core::types::{LogRecord, SecurityTag, Session, SessionStatus};

use crate::classify::combined_text;

/// 세션 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// 세션 시작
    Login,
    /// 세션 종료
    Logout,
}

/// 레코드에서 세션 이벤트를 판별합니다.
///
/// 보안 태그를 우선 보고, 문구 폴백을 순서대로 검사합니다.
pub fn detect_event(record: &LogRecord) -> Option<SessionEvent> {
    if record.security_tags.contains(&SecurityTag::SuccessfulLogin) {
        return Some(SessionEvent::Login);
    }
    let text = combined_text(&record.raw, &record.template);
    if text.contains("session opened")
        || text.contains("accepted password")
        || text.contains("accepted publickey")
    {
        return Some(SessionEvent::Login);
    }
    if text.contains("session closed") || text.contains("logged out") {
        return Some(SessionEvent::Logout);
    }
    None
}

/// 세션 식별 키
///
/// 추출된 프로세스 id가 있으면 그것이 가장 정확한 스트림 구분자입니다.
/// 없으면 사용자+서비스로 폴백합니다 (su 세션이 sshd 세션과 섞이지
/// 않게 하는 최소 단위).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// 추출된 프로세스 id
    Pid(String),
    /// 사용자+서비스 폴백
    UserService(String, String),
}

/// 두 단계 키 선택 함수
///
/// 사용자명이 없는 이벤트는 세션을 구성할 수 없으므로 None입니다.
pub fn session_key(record: &LogRecord) -> Option<SessionKey> {
    let user = record.username.as_deref()?;
    match record.parameters.get("PID") {
        Some(pid) if !pid.is_empty() => Some(SessionKey::Pid(pid.clone())),
        _ => Some(SessionKey::UserService(
            user.to_owned(),
            record.service.clone(),
        )),
    }
}

struct OpenSession {
    user: String,
    service: String,
    start: NaiveDateTime,
}

/// 세션 상관기
///
/// 실행마다 새로 만들며, 상태는 실행 간에 공유되지 않습니다.
pub struct SessionCorrelator {
    config: SessionConfig,
    /// 식별 키 → 열린 시작 시각 스택 (LIFO)
    stacks: HashMap<SessionKey, Vec<OpenSession>>,
    /// 키 최초 등장 순서 -- 남은 세션 방출을 결정적으로 만듭니다
    key_order: Vec<SessionKey>,
    closed: Vec<Session>,
    /// (user, service, event) → 마지막 관측 시각, 급속 중복 제거용
    last_seen: HashMap<(String, String, SessionEvent), NaiveDateTime>,
    orphan_logouts: u64,
}

impl SessionCorrelator {
    /// 새 상관기를 생성합니다.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            stacks: HashMap::new(),
            key_order: Vec::new(),
            closed: Vec::new(),
            last_seen: HashMap::new(),
            orphan_logouts: 0,
        }
    }

    /// 레코드 하나를 관측합니다. 파일 순서대로 호출해야 합니다.
    ///
    /// 타임스탬프가 없는 레코드는 상관 분석에서 제외됩니다.
    pub fn observe(&mut self, record: &LogRecord) {
        let Some(ts) = record.timestamp else { return };
        let Some(event) = detect_event(record) else {
            return;
        };
        let Some(key) = session_key(record) else { return };
        let Some(user) = record.username.clone() else {
            return;
        };
        let service = record.service.clone();

        // 같은 이벤트가 수 초 안에 반복 기록되는 로그 중복 방지
        let dedupe_key = (user.clone(), service.clone(), event);
        if let Some(last) = self.last_seen.get(&dedupe_key) {
            if (ts - *last).num_seconds() < self.config.dedupe_window_secs as i64 {
                return;
            }
        }
        self.last_seen.insert(dedupe_key, ts);

        match event {
            SessionEvent::Login => {
                if !self.stacks.contains_key(&key) {
                    self.key_order.push(key.clone());
                }
                self.stacks.entry(key).or_default().push(OpenSession {
                    user,
                    service,
                    start: ts,
                });
            }
            SessionEvent::Logout => match self.stacks.get_mut(&key).and_then(Vec::pop) {
                Some(open) => {
                    let secs = (ts - open.start).num_seconds();
                    self.closed.push(Session {
                        user: open.user,
                        service: open.service,
                        start: open.start,
                        end: Some(ts),
                        status: SessionStatus::Closed,
                        duration: Some(format_duration(secs)),
                    });
                }
                None => {
                    self.orphan_logouts += 1;
                    tracing::debug!(user = %user, service = %service, "orphan logout dropped");
                }
            },
        }
    }

    /// 버려진 짝 없는 LOGOUT 수
    pub fn orphan_logouts(&self) -> u64 {
        self.orphan_logouts
    }

    /// 스트림 종료를 선언하고 전체 세션 목록을 돌려줍니다.
    ///
    /// 아직 열린 세션은 최대 관측 시각 기준으로 Active/Stale이 됩니다.
    /// 이후 다시 닫히는 일은 없습니다.
    pub fn finish(mut self, max_timestamp: Option<NaiveDateTime>) -> Vec<Session> {
        let mut sessions = std::mem::take(&mut self.closed);
        let stale_after = chrono::Duration::hours(self.config.stale_after_hours as i64);

        for key in &self.key_order {
            let Some(stack) = self.stacks.get(key) else {
                continue;
            };
            for open in stack {
                let status = match max_timestamp {
                    Some(now) if now - open.start >= stale_after => SessionStatus::Stale,
                    _ => SessionStatus::Active,
                };
                sessions.push(Session {
                    user: open.user.clone(),
                    service: open.service.clone(),
                    start: open.start,
                    end: None,
                    status,
                    duration: None,
                });
            }
        }
        sessions
    }
}

/// 초 단위 지속 시간을 읽기 좋은 문자열로 바꿉니다.
///
/// 0인 구성 요소는 생략합니다 ("2h 15m", "5m 3s", "45s").
pub fn format_duration(total_secs: i64) -> String {
    let s = total_secs.max(0);
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let sec = s % 60;
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {sec}s")
    } else {
        format!("{sec}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::NaiveDate;
    use logsmith_core::types::Severity;

    fn ts(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 6, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn event_record(
        ordinal: usize,
        raw: &str,
        user: &str,
        service: &str,
        pid: Option<&str>,
        timestamp: NaiveDateTime,
    ) -> LogRecord {
        let mut parameters = BTreeMap::new();
        if let Some(pid) = pid {
            parameters.insert("PID".to_owned(), pid.to_owned());
        }
        LogRecord {
            ordinal,
            raw: raw.to_owned(),
            normalized: String::new(),
            cluster_id: 1,
            template: String::new(),
            parameters,
            timestamp: Some(timestamp),
            severity: Severity::Info,
            security_tags: BTreeSet::new(),
            service: service.to_owned(),
            username: Some(user.to_owned()),
            remote_host: None,
        }
    }

    fn login(ordinal: usize, user: &str, timestamp: NaiveDateTime) -> LogRecord {
        event_record(
            ordinal,
            "session opened for user",
            user,
            "sshd",
            None,
            timestamp,
        )
    }

    fn logout(ordinal: usize, user: &str, timestamp: NaiveDateTime) -> LogRecord {
        event_record(
            ordinal,
            "session closed for user",
            user,
            "sshd",
            None,
            timestamp,
        )
    }

    #[test]
    fn logout_closes_most_recent_login() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        correlator.observe(&login(0, "alice", ts(15, 10, 0, 0)));
        correlator.observe(&login(1, "alice", ts(15, 10, 5, 0)));
        correlator.observe(&logout(2, "alice", ts(15, 10, 10, 0)));
        let sessions = correlator.finish(Some(ts(15, 10, 10, 0)));

        assert_eq!(sessions.len(), 2);
        let closed: Vec<_> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Closed)
            .collect();
        assert_eq!(closed.len(), 1);
        // 가장 최근 로그인(10:05)이 닫혀야 함
        assert_eq!(closed[0].start, ts(15, 10, 5, 0));
        assert_eq!(closed[0].end, Some(ts(15, 10, 10, 0)));
        assert_eq!(closed[0].duration.as_deref(), Some("5m 0s"));

        let open: Vec<_> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Active)
            .collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].start, ts(15, 10, 0, 0));
    }

    #[test]
    fn orphan_logout_is_dropped() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        correlator.observe(&logout(0, "alice", ts(15, 10, 0, 0)));
        assert_eq!(correlator.orphan_logouts(), 1);
        let sessions = correlator.finish(Some(ts(15, 10, 0, 0)));
        assert!(sessions.is_empty());
    }

    #[test]
    fn session_older_than_a_day_is_stale() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        correlator.observe(&login(0, "root", ts(15, 8, 0, 0)));
        correlator.observe(&login(1, "guest", ts(16, 7, 0, 0)));
        let sessions = correlator.finish(Some(ts(16, 9, 0, 0)));

        assert_eq!(sessions.len(), 2);
        let by_user: BTreeMap<_, _> = sessions
            .iter()
            .map(|s| (s.user.clone(), s.status))
            .collect();
        assert_eq!(by_user.get("root"), Some(&SessionStatus::Stale));
        assert_eq!(by_user.get("guest"), Some(&SessionStatus::Active));
    }

    #[test]
    fn rapid_duplicate_login_is_deduped() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        correlator.observe(&login(0, "alice", ts(15, 10, 0, 0)));
        correlator.observe(&login(1, "alice", ts(15, 10, 0, 1)));
        let sessions = correlator.finish(Some(ts(15, 10, 0, 1)));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn different_users_do_not_dedupe_each_other() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        correlator.observe(&login(0, "alice", ts(15, 10, 0, 0)));
        correlator.observe(&login(1, "bob", ts(15, 10, 0, 1)));
        let sessions = correlator.finish(Some(ts(15, 10, 0, 1)));
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn record_without_timestamp_is_excluded() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        let mut record = login(0, "alice", ts(15, 10, 0, 0));
        record.timestamp = None;
        correlator.observe(&record);
        assert!(correlator.finish(None).is_empty());
    }

    #[test]
    fn key_prefers_extracted_pid() {
        let record = event_record(
            0,
            "session opened",
            "cyrus",
            "su",
            Some("21416"),
            ts(15, 4, 6, 18),
        );
        assert_eq!(
            session_key(&record),
            Some(SessionKey::Pid("21416".to_owned()))
        );
    }

    #[test]
    fn key_falls_back_to_user_and_service() {
        let record = event_record(0, "session opened", "cyrus", "su", None, ts(15, 4, 6, 18));
        assert_eq!(
            session_key(&record),
            Some(SessionKey::UserService("cyrus".to_owned(), "su".to_owned()))
        );
    }

    #[test]
    fn key_requires_username() {
        let mut record = event_record(0, "session opened", "x", "su", None, ts(15, 4, 6, 18));
        record.username = None;
        assert_eq!(session_key(&record), None);
    }

    #[test]
    fn pid_key_separates_interleaved_streams() {
        let mut correlator = SessionCorrelator::new(SessionConfig::default());
        let login_a = event_record(0, "session opened", "root", "su", Some("100"), ts(15, 9, 0, 0));
        let login_b = event_record(1, "session opened", "root", "su", Some("200"), ts(15, 9, 5, 0));
        let logout_a = event_record(2, "session closed", "root", "su", Some("100"), ts(15, 9, 10, 0));
        correlator.observe(&login_a);
        correlator.observe(&login_b);
        correlator.observe(&logout_a);
        let sessions = correlator.finish(Some(ts(15, 9, 10, 0)));

        let closed: Vec<_> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Closed)
            .collect();
        // PID 키가 없었다면 LIFO가 9:05 로그인을 닫았을 것
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].start, ts(15, 9, 0, 0));
    }

    #[test]
    fn duration_formatting_omits_zero_components() {
        assert_eq!(format_duration(2 * 3600 + 15 * 60), "2h 15m");
        assert_eq!(format_duration(5 * 60 + 3), "5m 3s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn detect_event_from_phrases() {
        let login_rec = event_record(
            0,
            "Accepted password for alice from 10.0.0.1",
            "alice",
            "sshd",
            None,
            ts(15, 1, 0, 0),
        );
        assert_eq!(detect_event(&login_rec), Some(SessionEvent::Login));

        let logout_rec = event_record(
            1,
            "user alice logged out",
            "alice",
            "sshd",
            None,
            ts(15, 1, 5, 0),
        );
        assert_eq!(detect_event(&logout_rec), Some(SessionEvent::Logout));

        let other = event_record(2, "connection refused", "alice", "sshd", None, ts(15, 1, 6, 0));
        assert_eq!(detect_event(&other), None);
    }
}
