//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.
//! 엔진은 이 타입들을 생성하고, 리포팅 레이어는 소비만 합니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 파라미터 맵에 예약된 원본 줄 순서 키
///
/// 타임스탬프 기준으로 정렬한 뒤에도 이 키로 원본 파일 순서를
/// 복원할 수 있습니다. `<TAG>` 유래 키와 충돌하지 않도록
/// 언더스코어 접두사를 사용합니다.
pub const LINE_INDEX_KEY: &str = "_LINE_INDEX";

/// 심각도 레벨
///
/// 로그 레코드의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Warning < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 경고 -- 실패/거부 등 비정상 징후
    Warning,
    /// 치명적 -- 즉시 확인 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// 보안 분류 태그
///
/// 하나의 레코드에 0개 이상 누적될 수 있으므로 집합으로 보관합니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SecurityTag {
    /// 존재하지 않는 계정 접근 시도
    IllegalAccess,
    /// 인증 실패
    AuthFailure,
    /// 루트/권한 상승 관련 활동
    PrivilegeActivity,
    /// 로그인 성공
    SuccessfulLogin,
    /// 세션 종료
    SessionLogout,
}

impl fmt::Display for SecurityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalAccess => write!(f, "Illegal Access"),
            Self::AuthFailure => write!(f, "Auth Failure"),
            Self::PrivilegeActivity => write!(f, "Privilege Activity"),
            Self::SuccessfulLogin => write!(f, "Successful Login"),
            Self::SessionLogout => write!(f, "Session Logout"),
        }
    }
}

/// 보안 태그 집합을 리포트용 문자열로 변환합니다.
///
/// 태그가 없으면 `"Normal"`을 반환합니다.
pub fn security_label(tags: &BTreeSet<SecurityTag>) -> String {
    if tags.is_empty() {
        return "Normal".to_owned();
    }
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 클러스터링 엔진이 한 줄에 대해 돌려주는 마이닝 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedTemplate {
    /// 안정적인 클러스터 식별자
    pub cluster_id: u64,
    /// 마이닝된 템플릿 패턴 (리터럴 + `<TAG>` + `<*>` 와일드카드)
    pub template: String,
}

/// 템플릿 클러스터 -- 같은 템플릿으로 묶인 줄들의 집계
///
/// 클러스터링 엔진이 소유하며, 레코드는 `cluster_id`로 참조만 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCluster {
    /// 클러스터 식별자
    pub cluster_id: u64,
    /// 템플릿 패턴
    pub template: String,
    /// 이 클러스터에 속한 줄 수
    pub occurrences: u64,
}

impl fmt::Display for TemplateCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} ({}x) {}",
            self.cluster_id, self.occurrences, self.template,
        )
    }
}

/// 구조화된 로그 레코드
///
/// 입력 한 줄당 한 번 생성됩니다. 연도 롤오버 보정(1회)을 제외하면
/// 불변이며, 실행 중 삭제되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// 원본 파일 내 0 기반 줄 순서 -- 정렬 복원의 기준
    pub ordinal: usize,
    /// 원본 줄
    pub raw: String,
    /// 정규화(마스킹)된 줄
    pub normalized: String,
    /// 소속 클러스터 식별자
    pub cluster_id: u64,
    /// 소속 클러스터의 템플릿 패턴
    pub template: String,
    /// 태그명 → 추출값 (중복 태그 값은 `", "`로 연결, `_LINE_INDEX` 예약 키 포함)
    pub parameters: BTreeMap<String, String>,
    /// 앵커 연도가 적용된 절대 타임스탬프 -- 해석 실패 시 None
    pub timestamp: Option<NaiveDateTime>,
    /// 심각도
    pub severity: Severity,
    /// 보안 태그 집합 (비어 있으면 "Normal")
    pub security_tags: BTreeSet<SecurityTag>,
    /// 서비스명 (syslog 헤더 다음 프로세스 토큰, 예: "sshd")
    pub service: String,
    /// 추출된 사용자명 (있을 경우)
    pub username: Option<String>,
    /// 추출된 원격 호스트 문자열 (있을 경우, 복합 값 가능)
    pub remote_host: Option<String>,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] #{} {}: {}",
            self.severity, self.cluster_id, self.service, self.raw,
        )
    }
}

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// 로그아웃으로 정상 종료됨
    Closed,
    /// 스트림 종료 시점까지 열려 있음 (24시간 미만)
    Active,
    /// 최대 관측 시각 기준 24시간 이상 열려 있음
    Stale,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Active => write!(f, "Active"),
            Self::Stale => write!(f, "Stale"),
        }
    }
}

/// 재구성된 사용자 세션
///
/// LOGIN 이벤트에서 생성되고, 대응하는 LOGOUT에서 Closed로 닫힙니다.
/// 스트림이 끝날 때까지 열려 있으면 Active 또는 Stale이 되며
/// 이후 다시 닫히지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 사용자명
    pub user: String,
    /// 서비스명
    pub service: String,
    /// 시작 시각
    pub start: NaiveDateTime,
    /// 종료 시각 -- 열린 세션은 None
    pub end: Option<NaiveDateTime>,
    /// 상태
    pub status: SessionStatus,
    /// 사람이 읽는 지속 시간 (닫힌 세션만, 예: "2h 15m")
    pub duration: Option<String>,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.end, &self.duration) {
            (Some(end), Some(dur)) => write!(
                f,
                "{}@{} {} -> {} ({})",
                self.user, self.service, self.start, end, dur,
            ),
            _ => write!(
                f,
                "{}@{} {} -> ... ({})",
                self.user, self.service, self.start, self.status,
            ),
        }
    }
}

/// 무차별 대입 의심 호스트
///
/// 어떤 후행 윈도우의 실패 수가 임계값에 도달한 호스트당 하나 생성됩니다.
/// 생성 후에는 최대 버스트 수치 갱신 외에 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatCandidate {
    /// 호스트 식별 문자열 -- 복합 값(IP + 도메인)도 통째로 하나의 키
    pub host: String,
    /// 임계값을 처음 넘은 시각
    pub triggered_at: NaiveDateTime,
    /// 관측된 최대 롤링 윈도우 카운트 (버스트 레이트)
    pub max_burst: u64,
    /// 실행 전체에서의 총 실패 수
    pub total_failures: u64,
}

impl fmt::Display for ThreatCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} burst={} total={} first_triggered={}",
            self.host, self.max_burst, self.total_failures, self.triggered_at,
        )
    }
}
