//! 분류기 -- 키워드 테이블 기반 심각도/보안 태그 판정
//!
//! 레코드 단위의 순수 함수입니다. 판정 기준은 아래의 명명된 상수
//! 테이블이 전부이므로, 분류 동작은 파이프라인과 무관하게 단독으로
//! 감사하고 테스트할 수 있습니다. 테이블을 수정하면
//! [`RULESET_REVISION`]을 올립니다.

use std::collections::BTreeSet;

use logsmith_core::types::{SecurityTag, Severity};

/// 키워드 테이블 개정 번호
pub const RULESET_REVISION: u32 = 1;

/// CRITICAL 판정 키워드
pub const FATAL_KEYWORDS: &[&str] = &["critical", "fatal", "panic", "emergency", "alert", "died"];

/// WARNING 판정 키워드
pub const WARNING_KEYWORDS: &[&str] = &["warning", "warn", "error", "refused", "failed"];

/// "died"에 걸리지만 실제로는 무해한 telnetd 상대방 종료 문구
pub const BENIGN_DISCONNECT_PHRASE: &str = "peer died";

/// Illegal Access 문구
pub const ILLEGAL_ACCESS_PHRASES: &[&str] = &["illegal", "invalid user"];

/// Auth Failure 문구
pub const AUTH_FAILURE_PHRASES: &[&str] = &[
    "authentication failure",
    "failed password",
    "couldn't authenticate",
];

/// Privilege Activity -- 서비스명 쪽 단서
pub const PRIVILEGE_SERVICE_HINTS: &[&str] = &["sudo", "su"];

/// Privilege Activity -- 본문 쪽 단서
pub const PRIVILEGE_TEXT_PHRASES: &[&str] = &["uid=0", "id=0", "user=root"];

/// Successful Login 문구
pub const LOGIN_PHRASES: &[&str] = &["session opened", "accepted"];

/// Session Logout 문구
pub const LOGOUT_PHRASES: &[&str] = &["session closed", "logged out"];

/// 레코드의 결합 텍스트(원본 + 템플릿)를 분류용 소문자 형태로 만듭니다.
pub fn combined_text(raw: &str, template: &str) -> String {
    format!("{raw} {template}").to_lowercase()
}

/// 심각도를 판정합니다. 입력은 [`combined_text`]의 소문자 텍스트입니다.
///
/// 무해한 접속 종료 문구가 치명 키워드("died")에 오탐되지 않도록
/// 먼저 걸러냅니다.
pub fn classify_severity(text: &str) -> Severity {
    if text.contains(BENIGN_DISCONNECT_PHRASE) {
        return Severity::Info;
    }
    if FATAL_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Severity::Critical;
    }
    if WARNING_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Severity::Warning;
    }
    Severity::Info
}

/// 보안 태그 집합을 판정합니다. 각 그룹은 독립적으로 검사되어
/// 0개 이상의 태그가 누적됩니다.
pub fn classify_security(text: &str, service: &str) -> BTreeSet<SecurityTag> {
    let service = service.to_lowercase();
    let mut tags = BTreeSet::new();

    if ILLEGAL_ACCESS_PHRASES.iter().any(|p| text.contains(p)) {
        tags.insert(SecurityTag::IllegalAccess);
    }
    if AUTH_FAILURE_PHRASES.iter().any(|p| text.contains(p)) {
        tags.insert(SecurityTag::AuthFailure);
    }
    if PRIVILEGE_SERVICE_HINTS.iter().any(|h| service.contains(h))
        || PRIVILEGE_TEXT_PHRASES.iter().any(|p| text.contains(p))
    {
        tags.insert(SecurityTag::PrivilegeActivity);
    }
    if LOGIN_PHRASES.iter().any(|p| text.contains(p)) {
        tags.insert(SecurityTag::SuccessfulLogin);
    }
    if LOGOUT_PHRASES.iter().any(|p| text.contains(p)) {
        tags.insert(SecurityTag::SessionLogout);
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_keyword_is_critical() {
        let text = combined_text(
            "Jun 15 12:12:34 combo logrotate: ALERT exited abnormally with [1]",
            "<TIMESTAMP> <HOSTNAME> logrotate: ALERT exited abnormally with [<NUM>]",
        );
        assert_eq!(classify_severity(&text), Severity::Critical);
    }

    #[test]
    fn peer_died_is_suppressed_to_info() {
        let text = combined_text(
            "Jun 15 02:04:59 combo telnetd[16732]: ttloop: peer died: Invalid or incomplete multibyte or wide character",
            "<TIMESTAMP> <HOSTNAME> telnetd[<PID>]: ttloop: peer died: <*>",
        );
        // "died"와 "invalid"가 모두 있어도 무해 문구가 이김
        assert_eq!(classify_severity(&text), Severity::Info);
    }

    #[test]
    fn failure_keyword_is_warning() {
        let text = combined_text(
            "Jun 15 02:04:59 combo sshd[1]: Failed password for root",
            "<TIMESTAMP> <HOSTNAME> sshd[<PID>]: Failed password for <USERNAME>",
        );
        assert_eq!(classify_severity(&text), Severity::Warning);
    }

    #[test]
    fn plain_line_is_info() {
        let text = combined_text(
            "Jun 15 02:04:59 combo sshd[1]: session listening",
            "<TIMESTAMP> <HOSTNAME> sshd[<PID>]: session listening",
        );
        assert_eq!(classify_severity(&text), Severity::Info);
    }

    #[test]
    fn auth_failure_and_privilege_tags_accumulate() {
        let text = combined_text(
            "Jun 15 02:04:59 combo sshd(pam_unix)[20882]: authentication failure; uid=0 user=root",
            "<TIMESTAMP> <HOSTNAME> sshd(pam_unix)[<PID>]: authentication failure; uid=<UID> user=<USERNAME>",
        );
        let tags = classify_security(&text, "sshd(pam_unix)");
        assert!(tags.contains(&SecurityTag::AuthFailure));
        assert!(tags.contains(&SecurityTag::PrivilegeActivity));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn invalid_user_is_illegal_access() {
        let text = combined_text(
            "Jun 15 02:04:59 combo sshd[1]: Invalid user admin from 10.0.0.1",
            "<TIMESTAMP> <HOSTNAME> sshd[<PID>]: Invalid user <USERNAME> from <RHOST>",
        );
        let tags = classify_security(&text, "sshd");
        assert!(tags.contains(&SecurityTag::IllegalAccess));
    }

    #[test]
    fn session_opened_is_successful_login() {
        let text = combined_text(
            "Jun 15 04:06:18 combo su(pam_unix)[21416]: session opened for user cyrus by (uid=0)",
            "<TIMESTAMP> <HOSTNAME> su(pam_unix)[<PID>]: session <STATE> for user <USERNAME> by (uid=<UID>)",
        );
        let tags = classify_security(&text, "su(pam_unix)");
        assert!(tags.contains(&SecurityTag::SuccessfulLogin));
        // su 서비스 + uid=0 -- 권한 활동도 함께
        assert!(tags.contains(&SecurityTag::PrivilegeActivity));
    }

    #[test]
    fn session_closed_is_logout() {
        let text = combined_text(
            "Jun 15 04:06:19 combo su(pam_unix)[21416]: session closed for user cyrus",
            "<TIMESTAMP> <HOSTNAME> su(pam_unix)[<PID>]: session <STATE> for user <USERNAME>",
        );
        let tags = classify_security(&text, "su(pam_unix)");
        assert!(tags.contains(&SecurityTag::SessionLogout));
    }

    #[test]
    fn no_phrase_yields_empty_set() {
        let text = combined_text(
            "Jun 15 02:04:59 combo syslogd 1.4.1: restart.",
            "<TIMESTAMP> <HOSTNAME> syslogd <*> restart.",
        );
        let tags = classify_security(&text, "syslogd");
        assert!(tags.is_empty());
    }
}
