//! 정규화 파이프라인 -- 순서 고정 재작성 규칙 목록
//!
//! 클러스터링 전에 휘발성 부분 문자열(타임스탬프, 호스트, ID, 상태)을
//! 안정적인 `<TAG>` 플레이스홀더로 치환합니다.
//!
//! # 규칙 순서 계약
//!
//! 규칙은 [`REWRITE_RULES`]에 선언된 순서 그대로 적용됩니다.
//! 문맥이 붙은 구체적 패턴(`rhost=`, 괄호 uid 형태, connection-from 절)이
//! 범용 패턴(맨몸 IPv4, 일반 `user <token>`)보다 먼저 와야 합니다.
//! 순서를 바꾸면 범용 규칙이 구체적 태그 몫의 텍스트를 먼저 소비합니다.
//! 리팩토링 시 규칙 추가는 허용되지만 재정렬은 금지입니다.
//!
//! 파이프라인은 멱등입니다: 이미 태그가 들어간 출력에 다시 적용해도
//! 결과가 변하지 않습니다. 각 규칙의 치환 결과는 자기 자신 또는
//! 어떤 규칙과도 다시 매칭되지 않는 형태입니다.

use regex::{Captures, Regex};

use crate::error::EngineError;

/// 고정 syslog 헤더 (3글자 월, 일, 시각, 호스트명)
const HEADER_PATTERN: &str = r"^([A-Z][a-z]{2}\s+\d+\s+\d{2}:\d{2}:\d{2})\s+(\S+)";

/// 줄 끝의 중복 ctime 타임스탬프 (" at Sat Jun 18 02:08:12 2005")
const TRAILING_TIMESTAMP_PATTERN: &str =
    r"\s+at\s+\w{3}\s+\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4}$";

/// ftpd의 "connection from <ip> (<name>)" 형태
const CONNECTION_FROM_PATTERN: &str =
    r"(connection from)\s+(\d{1,3}(?:\.\d{1,3}){3})\s*\(([^)]*)\)";

/// "LOGIN(uid=" 류 접두어 -- 추출 경로에서 "(uid="로 통일
const UID_PREFIX_PATTERN: &str = r"\b\w+\(uid=";

/// 재작성 규칙의 치환 동작
///
/// `regex` 크레이트에는 전후방 탐색이 없으므로, 원본 규칙의 탐색 조건은
/// 캡처 클로저의 명시적 가드로 표현합니다. 가드가 거부하면 매칭된
/// 텍스트를 그대로 돌려줍니다.
#[derive(Debug, Clone, Copy)]
enum Rewrite {
    /// 고정 치환 문자열 (`${n}` 그룹 참조 가능)
    Plain(&'static str),
    /// 상태 단어 -- 바로 뒤에 `:`가 오면 제외 ("opened:" 등 라벨 용법)
    StateWord,
    /// 일반 "user <token>" -- "user does ..." 관용구 제외
    GenericUser,
    /// 괄호 원격 호스트 -- 공백 뒤 괄호만, `uid=`/`Address`/`errno`/`ftpd`와
    /// 바이트 수 주석("36 chars")은 제외
    ParenRemoteHost,
    /// 포트가 붙을 수 있는 맨몸 IPv4 -- 숫자에 맞닿은 부분 문자열 제외
    BareAddress,
}

/// 순서 고정 재작성 규칙 테이블
///
/// 1부: 문맥 결합 마스크 (높은 우선순위)
/// 2부: 범용 마스크 (낮은 우선순위)
const REWRITE_RULES: &[(&str, &str, Rewrite)] = &[
    // --- 1. 문맥 결합 마스크 ---
    (
        "errno-annotation",
        r"\(Address already in use \(errno = \d+\)\)",
        Rewrite::Plain("(Address already in use (errno = <NUM>))"),
    ),
    (
        "failed-login-count",
        r"FAILED LOGIN\s+\d+",
        Rewrite::Plain("FAILED LOGIN <NUM>"),
    ),
    ("fd-number", r"fd\s+\d+", Rewrite::Plain("fd <NUM>")),
    (
        "seconds-count",
        r"\b\d+\s+seconds",
        Rewrite::Plain("<NUM> seconds"),
    ),
    (
        "numeric-comparison",
        r"\b\d+\s*([<>=!]+)\s*\d+",
        Rewrite::Plain("<NUM> ${1} <NUM>"),
    ),
    (
        "bad-username",
        r"bad username\s*\[.*?\]",
        Rewrite::Plain("bad username [<USERNAME>]"),
    ),
    (
        "password-changed",
        r"password changed for\s+\S+",
        Rewrite::Plain("password changed for <USERNAME>"),
    ),
    ("for-clause", r"FOR\s+.*?,", Rewrite::Plain("FOR <USERNAME>,")),
    (
        "uid-call",
        r"\b(?:\w+)?\(uid=\d+\)",
        Rewrite::Plain("(uid=<UID>)"),
    ),
    (
        "connection-from",
        r"([cC]onnect(?:ion)? from)\s+\S+",
        Rewrite::Plain("${1} <RHOST>"),
    ),
    (
        "state-word",
        r"\b(startup|shutdown|opened|closed)\b",
        Rewrite::StateWord,
    ),
    (
        "anonymous-ftp",
        r"ANONYMOUS FTP LOGIN FROM .+",
        Rewrite::Plain("ANONYMOUS FTP LOGIN FROM <RHOST>"),
    ),
    ("euid", r"\beuid=\d+", Rewrite::Plain("euid=<EUID>")),
    ("tty", r"\btty=\S+", Rewrite::Plain("tty=<TTY>")),
    // --- 2. 범용 마스크 ---
    (
        "embedded-ctime",
        r"\w{3}\s+\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4}",
        Rewrite::Plain("<TIMESTAMP>"),
    ),
    ("pid-brackets", r"\[\d+\]", Rewrite::Plain("[<PID>]")),
    (
        "uid-call-prefixed",
        r"\b(\w+)\(uid=\d+\)",
        Rewrite::Plain("${1}(uid=<UID>)"),
    ),
    ("uid", r"\buid=\d+", Rewrite::Plain("uid=<UID>")),
    (
        "user-assignment",
        r"user=\S+",
        Rewrite::Plain("user=<USERNAME>"),
    ),
    ("generic-user", r"user\s+(\S+)", Rewrite::GenericUser),
    ("paren-rhost", r"\(([^)]*)\)", Rewrite::ParenRemoteHost),
    (
        "rhost-assignment",
        r"rhost=\S+",
        Rewrite::Plain("rhost=<RHOST>"),
    ),
    (
        "bare-ipv4",
        r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(:\d+)?",
        Rewrite::BareAddress,
    ),
];

struct RewriteRule {
    pattern: Regex,
    rewrite: Rewrite,
}

/// 정규화기
///
/// 생성 시 모든 규칙을 한 번만 컴파일하여 보관합니다.
pub struct Normalizer {
    header: Regex,
    trailing_timestamp: Regex,
    connection_from: Regex,
    uid_prefix: Regex,
    rules: Vec<RewriteRule>,
}

impl Normalizer {
    /// 새 정규화기를 생성합니다. 규칙 컴파일 실패는 즉시 에러입니다.
    pub fn new() -> Result<Self, EngineError> {
        let mut rules = Vec::with_capacity(REWRITE_RULES.len());
        for (name, pattern, rewrite) in REWRITE_RULES {
            let compiled = Regex::new(pattern).map_err(|e| EngineError::RuleCompile {
                rule: (*name).to_owned(),
                reason: e.to_string(),
            })?;
            rules.push(RewriteRule {
                pattern: compiled,
                rewrite: *rewrite,
            });
        }
        Ok(Self {
            header: Regex::new(HEADER_PATTERN)?,
            trailing_timestamp: Regex::new(TRAILING_TIMESTAMP_PATTERN)?,
            connection_from: Regex::new(CONNECTION_FROM_PATTERN)?,
            uid_prefix: Regex::new(UID_PREFIX_PATTERN)?,
            rules,
        })
    }

    /// 원시 줄을 클러스터링 입력용으로 정규화합니다.
    ///
    /// 전처리(중복 끝 타임스탬프 제거, connection-from 표준화, 헤더 태깅)
    /// 후 재작성 규칙을 선언 순서대로 적용합니다.
    pub fn normalize(&self, raw: &str) -> String {
        let line = self.strip_trailing_timestamp(raw);
        let line = self.canonicalize_connection_from(&line);
        let mut line = self
            .header
            .replace(&line, "<TIMESTAMP> <HOSTNAME>")
            .into_owned();
        for rule in &self.rules {
            line = self.apply(rule, &line);
        }
        line.trim().to_owned()
    }

    /// 원시 줄을 파라미터 추출용으로 표준화합니다.
    ///
    /// 헤더와 태그는 건드리지 않고, 템플릿과의 표면 차이만 제거합니다:
    /// 중복 끝 타임스탬프, `LOGIN(uid=` 접두어, connection-from 괄호 형태.
    pub fn clean_for_extraction(&self, raw: &str) -> String {
        let line = self.strip_trailing_timestamp(raw);
        let line = self.uid_prefix.replace_all(&line, "(uid=").into_owned();
        self.canonicalize_connection_from(&line)
    }

    fn strip_trailing_timestamp(&self, line: &str) -> String {
        self.trailing_timestamp.replace(line, "").into_owned()
    }

    /// "connection from 1.2.3.4 (name)"을 "connection from 1.2.3.4 (name)"
    /// 또는 빈 괄호일 때 "connection from 1.2.3.4"로 표준화합니다.
    fn canonicalize_connection_from(&self, line: &str) -> String {
        self.connection_from
            .replace_all(line, |caps: &Captures| {
                let prefix = &caps[1];
                let ip = &caps[2];
                let inner = caps[3].trim().to_owned();
                if inner.is_empty() {
                    format!("{prefix} {ip}")
                } else {
                    format!("{prefix} {ip} ({inner})")
                }
            })
            .into_owned()
    }

    fn apply(&self, rule: &RewriteRule, text: &str) -> String {
        match rule.rewrite {
            Rewrite::Plain(replacement) => {
                rule.pattern.replace_all(text, replacement).into_owned()
            }
            Rewrite::StateWord => rule
                .pattern
                .replace_all(text, |caps: &Captures| {
                    caps.get(0).map_or_else(String::new, |m| {
                        if text[m.end()..].starts_with(':') {
                            m.as_str().to_owned()
                        } else {
                            "<STATE>".to_owned()
                        }
                    })
                })
                .into_owned(),
            Rewrite::GenericUser => rule
                .pattern
                .replace_all(text, |caps: &Captures| {
                    caps.get(0).map_or_else(String::new, |m| {
                        if is_does_idiom(&caps[1]) {
                            m.as_str().to_owned()
                        } else {
                            "user <USERNAME>".to_owned()
                        }
                    })
                })
                .into_owned(),
            Rewrite::ParenRemoteHost => rule
                .pattern
                .replace_all(text, |caps: &Captures| {
                    caps.get(0).map_or_else(String::new, |m| {
                        let inner = &caps[1];
                        let preceded_by_space = text[..m.start()]
                            .chars()
                            .next_back()
                            .is_some_and(char::is_whitespace);
                        let excluded = inner.starts_with("uid=")
                            || inner.starts_with("Address")
                            || inner.starts_with("errno")
                            || inner.starts_with("ftpd")
                            || inner.contains("chars");
                        if preceded_by_space && !excluded {
                            "(<RHOST>)".to_owned()
                        } else {
                            m.as_str().to_owned()
                        }
                    })
                })
                .into_owned(),
            Rewrite::BareAddress => rule
                .pattern
                .replace_all(text, |caps: &Captures| {
                    caps.get(0).map_or_else(String::new, |m| {
                        let touches_digit = text[..m.start()]
                            .chars()
                            .next_back()
                            .is_some_and(|c| c.is_ascii_digit())
                            || text[m.end()..]
                                .chars()
                                .next()
                                .is_some_and(|c| c.is_ascii_digit());
                        if touches_digit {
                            m.as_str().to_owned()
                        } else {
                            "<RHOST>".to_owned()
                        }
                    })
                })
                .into_owned(),
        }
    }
}

/// "user does not have access" 류에서 "does"는 사용자명이 아닙니다.
fn is_does_idiom(token: &str) -> bool {
    token.strip_prefix("does").is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}
