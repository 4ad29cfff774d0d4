//! 시간 해석기 -- 앵커 연도 결정과 단일 롤오버 보정
//!
//! syslog 헤더에는 연도가 없습니다. 전체 레코드를 파일 순서로 한 번
//! 훑어 처음 나오는 명시적 연도(추출된 타임스탬프 또는 줄 끝)를 앵커로
//! 삼고, 없으면 주어진 달력 연도로 폴백합니다. 앵커 적용 후 12월→1월
//! 전환을 한 번만 찾아 그 지점부터 1년을 더합니다. 실행당 하나의
//! 경계만 보정합니다 (다중 롤오버 로그는 범위 밖).

use chrono::{Datelike, NaiveDateTime};
use regex::Regex;

use logsmith_core::types::LogRecord;

use crate::error::EngineError;

/// 명시적 연도 -- 포트/PID 오인을 피하기 위해 20xx만 인정
const EXPLICIT_YEAR_PATTERN: &str = r"20\d{2}";

/// 줄 끝의 명시적 연도 (중복 ctime 타임스탬프 꼬리)
const TRAILING_YEAR_PATTERN: &str = r"(20\d{2})\s*$";

/// 앵커 연도를 붙인 뒤의 파싱 형식
const TIMESTAMP_FORMAT: &str = "%Y %b %d %H:%M:%S";

/// 시간 해석 결과 요약
#[derive(Debug, Clone)]
pub struct TimeSummary {
    /// 적용된 앵커 연도
    pub anchor_year: i32,
    /// 앵커를 로그에서 찾았는지 (false면 폴백 연도)
    pub anchor_from_logs: bool,
    /// 롤오버 경계가 시작된 레코드 인덱스 (없으면 None)
    pub rollover_at: Option<usize>,
    /// 타임스탬프 해석에 실패한 레코드 수
    pub unresolved: usize,
}

/// 시간 해석기
pub struct TimeResolver {
    explicit_year: Regex,
    trailing_year: Regex,
}

impl TimeResolver {
    /// 새 시간 해석기를 생성합니다.
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            explicit_year: Regex::new(EXPLICIT_YEAR_PATTERN)?,
            trailing_year: Regex::new(TRAILING_YEAR_PATTERN)?,
        })
    }

    /// 파일 순서의 레코드 전체에 절대 타임스탬프를 부여합니다.
    ///
    /// 해석 불가 레코드는 `timestamp = None`으로 남아 세션/위협 분석에서만
    /// 제외됩니다. 레코드 자체는 유지됩니다.
    pub fn resolve(&self, records: &mut [LogRecord], fallback_year: i32) -> TimeSummary {
        let (anchor_year, anchor_from_logs) = self.detect_anchor_year(records, fallback_year);

        let mut unresolved = 0usize;
        for record in records.iter_mut() {
            record.timestamp = self.parse_record_time(record, anchor_year);
            if record.timestamp.is_none() {
                unresolved += 1;
            }
        }

        let rollover_at = apply_rollover(records);
        if rollover_at.is_some() {
            tracing::info!(anchor_year, "year rollover detected, adjusting subsequent records");
        }

        TimeSummary {
            anchor_year,
            anchor_from_logs,
            rollover_at,
            unresolved,
        }
    }

    /// 파일 순서로 처음 발견한 명시적 연도를 앵커로 돌려줍니다.
    ///
    /// 우선순위: 추출된 TIMESTAMP 파라미터 → 줄 끝의 연도.
    fn detect_anchor_year(&self, records: &[LogRecord], fallback: i32) -> (i32, bool) {
        for record in records {
            if let Some(ts) = record.parameters.get("TIMESTAMP") {
                if let Some(m) = self.explicit_year.find(ts) {
                    if let Ok(year) = m.as_str().parse() {
                        return (year, true);
                    }
                }
            }
            if let Some(caps) = self.trailing_year.captures(&record.raw) {
                if let Ok(year) = caps[1].parse() {
                    return (year, true);
                }
            }
        }
        (fallback, false)
    }

    fn parse_record_time(&self, record: &LogRecord, anchor_year: i32) -> Option<NaiveDateTime> {
        let ts = match record.parameters.get("TIMESTAMP") {
            Some(ts) if !ts.is_empty() => ts.clone(),
            _ => {
                // 헤더 추출이 실패한 줄 -- 원시 선두 토큰으로 재시도
                let parts: Vec<&str> = record.raw.split_whitespace().take(3).collect();
                if parts.len() < 3 {
                    return None;
                }
                parts.join(" ")
            }
        };

        // 공백 정규화 ("Jun  1" -> "Jun 1")
        let compact = ts.split_whitespace().collect::<Vec<_>>().join(" ");
        let stamped = if self.explicit_year.find(&compact).is_some_and(|m| m.start() == 0) {
            compact
        } else {
            format!("{anchor_year} {compact}")
        };
        NaiveDateTime::parse_from_str(&stamped, TIMESTAMP_FORMAT).ok()
    }
}

/// 첫 12월→1월 전환부터 1년을 더합니다. 경계 인덱스를 돌려줍니다.
///
/// 전환 탐지는 타임스탬프가 있는 레코드들 사이의 인접 쌍만 봅니다.
fn apply_rollover(records: &mut [LogRecord]) -> Option<usize> {
    let mut prev_month: Option<u32> = None;
    let mut boundary: Option<usize> = None;
    for (idx, record) in records.iter().enumerate() {
        let Some(ts) = record.timestamp else { continue };
        let month = ts.month();
        if prev_month == Some(12) && month == 1 {
            boundary = Some(idx);
            break;
        }
        prev_month = Some(month);
    }

    let boundary_idx = boundary?;
    for record in records[boundary_idx..].iter_mut() {
        if let Some(ts) = record.timestamp {
            // with_year는 2월 29일 등 달력 불일치에서 None -- 그대로 둠
            record.timestamp = ts.with_year(ts.year() + 1).or(record.timestamp);
        }
    }
    Some(boundary_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use logsmith_core::types::{LogRecord, Severity};

    fn record(ordinal: usize, raw: &str, timestamp_param: Option<&str>) -> LogRecord {
        let mut parameters = BTreeMap::new();
        if let Some(ts) = timestamp_param {
            parameters.insert("TIMESTAMP".to_owned(), ts.to_owned());
        }
        LogRecord {
            ordinal,
            raw: raw.to_owned(),
            normalized: String::new(),
            cluster_id: 1,
            template: String::new(),
            parameters,
            timestamp: None,
            severity: Severity::Info,
            security_tags: BTreeSet::new(),
            service: "sshd".to_owned(),
            username: None,
            remote_host: None,
        }
    }

    #[test]
    fn anchor_year_from_trailing_timestamp() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![
            record(0, "Jun 15 02:04:59 combo sshd[1]: check pass", Some("Jun 15 02:04:59")),
            record(
                1,
                "Jun 18 02:08:12 combo login: FAILED LOGIN at Sat Jun 18 02:08:12 2005",
                Some("Jun 18 02:08:12"),
            ),
        ];
        let summary = resolver.resolve(&mut records, 2024);
        assert_eq!(summary.anchor_year, 2005);
        assert!(summary.anchor_from_logs);
        assert_eq!(
            records[0].timestamp.map(|t| t.year()),
            Some(2005)
        );
    }

    #[test]
    fn fallback_year_when_no_explicit_year() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![record(
            0,
            "Jun 15 02:04:59 combo sshd[1]: check pass",
            Some("Jun 15 02:04:59"),
        )];
        let summary = resolver.resolve(&mut records, 2024);
        assert_eq!(summary.anchor_year, 2024);
        assert!(!summary.anchor_from_logs);
        assert_eq!(records[0].timestamp.map(|t| t.year()), Some(2024));
    }

    #[test]
    fn rollover_advances_year_from_boundary() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![
            record(0, "Dec 31 23:58:00 combo sshd[1]: a", Some("Dec 31 23:58:00")),
            record(1, "Jan 1 00:02:00 combo sshd[1]: b", Some("Jan 1 00:02:00")),
            record(2, "Jan 1 00:05:00 combo sshd[1]: c", Some("Jan 1 00:05:00")),
        ];
        let summary = resolver.resolve(&mut records, 2005);
        assert_eq!(summary.rollover_at, Some(1));
        assert_eq!(records[0].timestamp.map(|t| t.year()), Some(2005));
        assert_eq!(records[1].timestamp.map(|t| t.year()), Some(2006));
        assert_eq!(records[2].timestamp.map(|t| t.year()), Some(2006));
    }

    #[test]
    fn only_first_rollover_is_corrected() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![
            record(0, "Dec 31 23:58:00 combo sshd[1]: a", Some("Dec 31 23:58:00")),
            record(1, "Jan 1 00:02:00 combo sshd[1]: b", Some("Jan 1 00:02:00")),
            record(2, "Dec 31 23:59:00 combo sshd[1]: c", Some("Dec 31 23:59:00")),
            record(3, "Jan 1 00:01:00 combo sshd[1]: d", Some("Jan 1 00:01:00")),
        ];
        let summary = resolver.resolve(&mut records, 2005);
        assert_eq!(summary.rollover_at, Some(1));
        // 두 번째 경계는 보정하지 않음: 전부 +1년만 적용
        assert_eq!(records[2].timestamp.map(|t| t.year()), Some(2006));
        assert_eq!(records[3].timestamp.map(|t| t.year()), Some(2006));
    }

    #[test]
    fn unparseable_timestamp_stays_none() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![
            record(0, "garbage", None),
            record(1, "Jun 15 02:04:59 combo sshd[1]: ok", Some("Jun 15 02:04:59")),
        ];
        let summary = resolver.resolve(&mut records, 2005);
        assert_eq!(summary.unresolved, 1);
        assert!(records[0].timestamp.is_none());
        assert!(records[1].timestamp.is_some());
    }

    #[test]
    fn raw_token_fallback_when_header_extraction_failed() {
        let resolver = TimeResolver::new().unwrap();
        let mut records = vec![record(0, "Jun 15 02:04:59 combo sshd[1]: ok", None)];
        let summary = resolver.resolve(&mut records, 2005);
        assert_eq!(summary.unresolved, 0);
        assert_eq!(
            records[0].timestamp.map(|t| (t.month(), t.day())),
            Some((6, 15))
        );
    }
}
