//! 배치 분석기 -- 파일 하나에 대한 단일 순서 보존 패스
//!
//! 줄 읽기 → (노이즈 프리필터) → 정규화 → 마이닝 → 추출 → 레코드 조립 →
//! 시간 해석 → 분류 → 세션 상관 → 위협 탐지를 엄격히 순차로 수행합니다.
//! 클러스터링 엔진은 삽입 순서에 민감하므로 이 패스 안에서 줄이 순서를
//! 벗어나는 일은 없습니다.
//!
//! 분석기는 한 실행에서 소모됩니다 (`analyze_*`가 `self`를 가져감).
//! 실행 간 상태 공유가 구조적으로 불가능합니다.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Datelike;

use logsmith_core::error::{AnalysisError, LogsmithError};
use logsmith_core::pipeline::TemplateMiner;
use logsmith_core::types::{LINE_INDEX_KEY, LogRecord, Severity};

use crate::classify::{classify_security, classify_severity, combined_text};
use crate::config::AnalyzerConfig;
use crate::extract::ParameterExtractor;
use crate::miner::TokenMergeMiner;
use crate::noise::NoiseFilter;
use crate::normalize::Normalizer;
use crate::report::{AnalysisReport, AnalysisStats, group_sessions};
use crate::session::SessionCorrelator;
use crate::threat::ThreatDetector;
use crate::timeline::TimeResolver;

/// 배치 분석기
///
/// [`LogAnalyzerBuilder`]로 만듭니다. 클러스터링 엔진은 단일 소유
/// 순차 자원이므로 분석기가 소유하며 외부와 공유하지 않습니다.
pub struct LogAnalyzer {
    config: AnalyzerConfig,
    normalizer: Normalizer,
    extractor: ParameterExtractor,
    resolver: TimeResolver,
    miner: Box<dyn TemplateMiner>,
    noise: Option<NoiseFilter>,
}

/// 분석기 빌더
///
/// 마이너를 지정하지 않으면 기본 [`TokenMergeMiner`]를 씁니다.
pub struct LogAnalyzerBuilder {
    config: AnalyzerConfig,
    miner: Option<Box<dyn TemplateMiner>>,
}

impl LogAnalyzerBuilder {
    /// 기본 설정으로 빌더를 만듭니다.
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            miner: None,
        }
    }

    /// 설정을 지정합니다.
    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 클러스터링 엔진을 주입합니다.
    pub fn miner(mut self, miner: Box<dyn TemplateMiner>) -> Self {
        self.miner = Some(miner);
        self
    }

    /// 분석기를 만듭니다.
    pub fn build(self) -> Result<LogAnalyzer, LogsmithError> {
        let similarity = self.config.miner.similarity;
        let miner = self
            .miner
            .unwrap_or_else(|| Box::new(TokenMergeMiner::new(similarity)));
        let noise = self
            .config
            .noise
            .enabled
            .then(|| NoiseFilter::new(&self.config.noise.blacklist));
        Ok(LogAnalyzer {
            normalizer: Normalizer::new()?,
            extractor: ParameterExtractor::new()?,
            resolver: TimeResolver::new()?,
            miner,
            noise,
            config: self.config,
        })
    }
}

impl Default for LogAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAnalyzer {
    /// 로그 파일 하나를 분석합니다.
    ///
    /// 파일을 읽을 수 없으면 실행 전체가 실패하며 부분 산출물을 내지
    /// 않습니다.
    pub fn analyze_file(self, path: impl AsRef<Path>) -> Result<AnalysisReport, LogsmithError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LogsmithError::Analysis(AnalysisError::InputUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        tracing::info!(path = %path.display(), "analyzing log file");
        self.analyze_lines(content.lines())
    }

    /// 줄 반복자를 분석합니다. 줄은 원본 순서여야 합니다.
    pub fn analyze_lines<'a, I>(mut self, lines: I) -> Result<AnalysisReport, LogsmithError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut records: Vec<LogRecord> = Vec::new();
        let mut total_lines = 0usize;
        let mut noise_filtered = 0usize;

        for line in lines {
            let raw = line.trim();
            if raw.is_empty() {
                continue;
            }
            total_lines += 1;

            if let Some(filter) = &self.noise {
                if let Some(matched) = filter.match_noise(raw) {
                    tracing::trace!(matched, "noise line filtered");
                    noise_filtered += 1;
                    continue;
                }
            }

            let ordinal = records.len();
            let normalized = self.normalizer.normalize(raw);
            let mined = self.miner.mine(&normalized)?;

            let clean = self.normalizer.clean_for_extraction(raw);
            let mut parameters = self.extractor.extract(&clean, &mined.template);
            // 헤더 형식은 신뢰 -- 템플릿 유래 추정값을 덮어씀
            if let Some((timestamp, hostname)) = self.extractor.extract_header(raw) {
                parameters.insert("TIMESTAMP".to_owned(), timestamp);
                parameters.insert("HOSTNAME".to_owned(), hostname);
            }
            parameters.insert(LINE_INDEX_KEY.to_owned(), ordinal.to_string());

            let username = parameters
                .get("USERNAME")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty());
            let remote_host = parameters
                .get("RHOST")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty());

            records.push(LogRecord {
                ordinal,
                raw: raw.to_owned(),
                normalized,
                cluster_id: mined.cluster_id,
                template: mined.template,
                parameters,
                timestamp: None,
                severity: Severity::Info,
                security_tags: BTreeSet::new(),
                service: service_of(raw),
                username,
                remote_host,
            });
        }

        // 시간 해석 (파일 순서 단일 스캔 + 롤오버 보정)
        let fallback_year = self
            .config
            .fallback_year
            .unwrap_or_else(|| chrono::Local::now().year());
        let time_summary = self.resolver.resolve(&mut records, fallback_year);

        // 분류 (레코드 단위 순수 함수)
        for record in &mut records {
            let text = combined_text(&record.raw, &record.template);
            record.severity = classify_severity(&text);
            record.security_tags = classify_security(&text, &record.service);
        }

        // 세션 상관 -- 파일 순서가 시간 순서 근사
        let mut correlator = SessionCorrelator::new(self.config.session.clone());
        for record in &records {
            correlator.observe(record);
        }
        let max_timestamp = records.iter().filter_map(|r| r.timestamp).max();
        let orphan_logouts = correlator.orphan_logouts();
        let sessions = group_sessions(correlator.finish(max_timestamp));

        // 위협 탐지
        let threats = ThreatDetector::new(self.config.threat.clone()).scan(&records);

        // 클러스터 집계 -- 발생 수 내림차순
        let mut clusters = self.miner.clusters();
        clusters.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then(a.cluster_id.cmp(&b.cluster_id))
        });

        let stats = AnalysisStats {
            total_lines,
            analyzed: records.len(),
            noise_filtered,
            unique_templates: clusters.len(),
            anchor_year: time_summary.anchor_year,
            anchor_from_logs: time_summary.anchor_from_logs,
            rollover_detected: time_summary.rollover_at.is_some(),
            unresolved_timestamps: time_summary.unresolved,
            orphan_logouts,
        };
        tracing::info!(
            total = stats.total_lines,
            templates = stats.unique_templates,
            sessions = sessions.len(),
            threats = threats.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            stats,
            records,
            clusters,
            sessions,
            threats,
        })
    }
}

/// syslog 헤더 다음 토큰에서 서비스명을 얻습니다 ("su(pam_unix)[123]:" -> "su(pam_unix)").
fn service_of(raw: &str) -> String {
    match raw.split_whitespace().nth(4) {
        Some(token) => token.split(['[', ':']).next().unwrap_or(token).to_owned(),
        None => "Unknown".to_owned(),
    }
}
