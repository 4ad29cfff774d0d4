//! 파라미터 추출기 -- 템플릿에서 매칭 패턴을 유도해 원본 줄의 값을 꺼냅니다.
//!
//! 마이닝된 템플릿의 리터럴을 이스케이프하고, 각 태그를 캡처 그룹으로
//! 치환한 전체 줄 앵커 패턴을 만들어 원본(표준화된) 줄에 적용합니다.
//! 템플릿마다 패턴을 한 번만 컴파일하여 캐싱합니다.
//!
//! 캡처 수가 네임드 태그 수와 정확히 일치할 때만 위치 기반으로
//! 매핑합니다. 와일드카드가 여분의 캡처를 만들면 잘못 정렬된 맵 대신
//! 빈 맵을 돌려줍니다 (알려진 보수적 제한).

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::error::EngineError;

/// 템플릿 안의 네임드 태그 (`<*>` 와일드카드는 제외)
const TAG_PATTERN: &str = r"<[A-Z]+>";

/// 고정 syslog 헤더 -- 템플릿과 무관하게 신뢰하는 추출 경로
const HEADER_PATTERN: &str = r"^([A-Z][a-z]{2}\s+\d+\s+\d{2}:\d{2}:\d{2})\s+(\S+)";

/// 구조 태그 전용의 좁은 캡처 패턴
const TIMESTAMP_CAPTURE: &str = r"([A-Z][a-z]{2}\s+\d+\s+\d{2}:\d{2}:\d{2})";
const HOSTNAME_CAPTURE: &str = r"(\S+)";

/// 같은 태그가 여러 번 나올 때 값을 잇는 구분자
const VALUE_SEPARATOR: &str = ", ";

/// 파라미터 추출기
///
/// 실행마다 새로 생성하며, 컴파일된 패턴 캐시는 인스턴스에 귀속됩니다.
pub struct ParameterExtractor {
    tag: Regex,
    header: Regex,
    /// 템플릿 → 컴파일된 패턴 (None은 컴파일 실패를 캐싱한 것)
    pattern_cache: HashMap<String, Option<Regex>>,
}

impl ParameterExtractor {
    /// 새 추출기를 생성합니다.
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self {
            tag: Regex::new(TAG_PATTERN)?,
            header: Regex::new(HEADER_PATTERN)?,
            pattern_cache: HashMap::new(),
        })
    }

    /// 표준화된 원본 줄에서 템플릿의 태그 값을 추출합니다.
    ///
    /// 실패(패턴 불일치, 컴파일 실패, 캡처 수 불일치)는 에러가 아니라
    /// 빈 맵입니다. 레코드는 원본 텍스트와 템플릿을 유지한 채
    /// 축소된 메타데이터로 남습니다.
    pub fn extract(&mut self, clean_raw: &str, template: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();

        let tags: Vec<String> = self
            .tag
            .find_iter(template)
            .map(|m| m.as_str().to_owned())
            .collect();

        let Some(pattern) = self.pattern_for(template) else {
            return params;
        };
        let Some(caps) = pattern.captures(clean_raw) else {
            return params;
        };

        if caps.len() - 1 != tags.len() {
            // 와일드카드가 만든 여분 캡처 -- 위치 매핑이 불가능하므로 포기
            tracing::debug!(
                template = %template,
                captures = caps.len() - 1,
                tags = tags.len(),
                "capture/tag count mismatch, abandoning extraction"
            );
            return params;
        }

        for (tag, group) in tags.iter().zip(1..caps.len()) {
            let key = tag.trim_start_matches('<').trim_end_matches('>').to_owned();
            let value = caps
                .get(group)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .to_owned();
            match params.get_mut(&key) {
                Some(existing) => {
                    // 이미 본 값은 다시 잇지 않음
                    if !existing.contains(value.as_str()) {
                        existing.push_str(VALUE_SEPARATOR);
                        existing.push_str(&value);
                    }
                }
                None => {
                    params.insert(key, value);
                }
            }
        }

        params
    }

    /// 고정 헤더에서 타임스탬프와 호스트명을 직접 추출합니다.
    ///
    /// 헤더 형식은 신뢰하므로, 이 값은 템플릿 유래 추정값을 항상
    /// 덮어씁니다.
    pub fn extract_header(&self, raw: &str) -> Option<(String, String)> {
        self.header
            .captures(raw)
            .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
    }

    fn pattern_for(&mut self, template: &str) -> Option<&Regex> {
        if !self.pattern_cache.contains_key(template) {
            let built = self.build_pattern(template);
            self.pattern_cache.insert(template.to_owned(), built);
        }
        self.pattern_cache.get(template).and_then(Option::as_ref)
    }

    /// 템플릿에서 전체 줄 앵커 매칭 패턴을 만듭니다.
    ///
    /// 순서가 중요합니다: 이스케이프 → 공백 유연화 → 와일드카드 복원 →
    /// 구조 태그 → 나머지 태그. 추출값 주변 공백이 변하므로 리터럴
    /// 공백은 `\s+?`로 풀어 줍니다.
    fn build_pattern(&self, template: &str) -> Option<Regex> {
        let mut pattern = regex::escape(template);
        pattern = pattern.replace(' ', r"\s+?");
        pattern = pattern.replace(r"<\*>", "(.*?)");
        pattern = pattern.replace("<TIMESTAMP>", TIMESTAMP_CAPTURE);
        pattern = pattern.replace("<HOSTNAME>", HOSTNAME_CAPTURE);
        // 남은 네임드 태그는 전부 비탐욕 캡처
        let pattern = self.tag.replace_all(&pattern, "(.*?)");

        let anchored = format!("^{pattern}$");
        match Regex::new(&anchored) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::debug!(template = %template, error = %e, "extraction pattern failed to compile");
                None
            }
        }
    }
}
