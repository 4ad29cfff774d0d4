//! 노이즈 프리필터 -- 하우스키핑 서비스 줄 제외
//!
//! 보안 분석에 신호가 없는 서비스(커널 부팅, 주변기기, 정기 작업 등)의
//! 줄을 블랙리스트로 걸러냅니다. 서비스 토큰이 키워드로 시작하면
//! 매칭으로 봅니다 -- syslog는 "crond[123]:"처럼 PID가 붙으므로
//! 동등 비교 대신 접두 비교를 씁니다.
//!
//! 프로세스 토큰을 찾지 못한 줄은 안전하게 유지됩니다.

use std::collections::BTreeSet;

/// 기본 블랙리스트 -- 분석 가치가 없는 하우스키핑 서비스
pub const BASE_BLACKLIST: &[&str] = &[
    // 1. 하드웨어/부팅
    "kernel", "rc", "irqbalance", "sysctl", "network", "random", "udev",
    "apmd", "smartd", "init",
    // 2. 주변기기
    "bluetooth", "sdpd", "hcid", "cups", "gpm",
    // 3. 정기 작업
    "logrotate", "syslog", "klogd", "crond", "anacron", "atd", "readahead",
    "messagebus", "ntpd", "dd",
    // 4. 네트워크 배관
    "rpc.statd", "rpcidmapd", "portmap", "nfslock", "automount", "ifup",
    "netfs", "autofs",
    // 5. 프록시/서버
    "privoxy", "squid", "sendmail", "spamassassin", "httpd", "xfs",
    "IIim", "htt", "htt_server", "canna", "named", "rsyncd", "mysqld", "FreeWnn",
];

/// syslog 헤더 다음의 프로세스 토큰 (5번째 토큰)
pub fn process_token(line: &str) -> Option<&str> {
    line.split_whitespace().nth(4)
}

/// 노이즈 프리필터
pub struct NoiseFilter {
    blacklist: Vec<String>,
}

impl NoiseFilter {
    /// 기본 블랙리스트에 추가 항목을 합쳐 필터를 만듭니다.
    pub fn new(extra: &[String]) -> Self {
        let mut blacklist: Vec<String> =
            BASE_BLACKLIST.iter().map(|s| (*s).to_owned()).collect();
        for entry in extra {
            if !entry.is_empty() && !blacklist.contains(entry) {
                blacklist.push(entry.clone());
            }
        }
        Self { blacklist }
    }

    /// 줄이 노이즈면 매칭된 블랙리스트 키워드를 돌려줍니다.
    pub fn match_noise(&self, line: &str) -> Option<&str> {
        let token = process_token(line)?;
        self.blacklist
            .iter()
            .find(|kw| token.starts_with(kw.as_str()))
            .map(String::as_str)
    }

    /// 줄이 노이즈인지 여부
    pub fn is_noise(&self, line: &str) -> bool {
        self.match_noise(line).is_some()
    }

    /// 블랙리스트에 없는 서비스명을 수집합니다.
    ///
    /// 블랙리스트 큐레이션용: "새로 보이는 서비스"를 정렬된 집합으로
    /// 돌려줍니다. "sshd[123]:"은 "sshd"로 정리합니다.
    pub fn unknown_services<'a, I>(&self, lines: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut unseen = BTreeSet::new();
        for line in lines {
            let Some(token) = process_token(line) else {
                continue;
            };
            if self.blacklist.iter().any(|kw| token.starts_with(kw.as_str())) {
                continue;
            }
            let clean = token
                .split('[')
                .next()
                .unwrap_or(token)
                .trim_end_matches(':');
            if !clean.is_empty() {
                unseen.insert(clean.to_owned());
            }
        }
        unseen
    }
}
