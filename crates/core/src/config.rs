//! 설정 관리 -- logsmith.toml 파싱 및 런타임 설정
//!
//! [`LogsmithConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSMITH_THREAT_MAX_RETRY=5` 형식)
//! 3. 설정 파일 (`logsmith.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logsmith_core::error::LogsmithError> {
//! use logsmith_core::config::LogsmithConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogsmithConfig::load("logsmith.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogsmithConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogsmithError};

/// Logsmith 통합 설정
///
/// `logsmith.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsmithConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 노이즈 프리필터 설정
    #[serde(default)]
    pub noise: NoiseConfig,
    /// 기본 템플릿 마이너 설정
    #[serde(default)]
    pub miner: MinerConfig,
    /// 세션 상관 분석 설정
    #[serde(default)]
    pub session: SessionConfig,
    /// 위협 탐지 설정
    #[serde(default)]
    pub threat: ThreatConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 출력 형식 (text, json)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

/// 노이즈 프리필터 설정
///
/// 활성화 시 하우스키핑 서비스의 줄을 분석에서 제외합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// 프리필터 활성화 여부 (기본: 비활성)
    #[serde(default)]
    pub enabled: bool,
    /// 기본 블랙리스트에 추가할 서비스명 목록
    #[serde(default)]
    pub blacklist: Vec<String>,
}

/// 기본 템플릿 마이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// 토큰 단위 유사도 병합 임계값 (0 초과 1 이하)
    pub similarity: f64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self { similarity: 0.75 }
    }
}

/// 세션 상관 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 급속 중복 이벤트 무시 윈도우 (초)
    pub dedupe_window_secs: u64,
    /// 열린 세션을 Stale로 판정하는 경과 시간 (시간)
    pub stale_after_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dedupe_window_secs: 2,
            stale_after_hours: 24,
        }
    }
}

/// 위협 탐지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    /// 후행 윈도우 폭 (분)
    pub window_minutes: u64,
    /// 윈도우당 실패 임계값
    pub max_retry: u64,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            window_minutes: 10,
            max_retry: 5,
        }
    }
}

impl LogsmithConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogsmithError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogsmithError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogsmithError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogsmithError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogsmithError> {
        toml::from_str(toml_str).map_err(|e| {
            LogsmithError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSMITH_{SECTION}_{FIELD}`
    /// 예: `LOGSMITH_THREAT_WINDOW_MINUTES=15`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSMITH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSMITH_GENERAL_LOG_FORMAT");

        // Noise
        override_bool(&mut self.noise.enabled, "LOGSMITH_NOISE_ENABLED");
        override_csv(&mut self.noise.blacklist, "LOGSMITH_NOISE_BLACKLIST");

        // Miner
        override_f64(&mut self.miner.similarity, "LOGSMITH_MINER_SIMILARITY");

        // Session
        override_u64(
            &mut self.session.dedupe_window_secs,
            "LOGSMITH_SESSION_DEDUPE_WINDOW_SECS",
        );
        override_u64(
            &mut self.session.stale_after_hours,
            "LOGSMITH_SESSION_STALE_AFTER_HOURS",
        );

        // Threat
        override_u64(
            &mut self.threat.window_minutes,
            "LOGSMITH_THREAT_WINDOW_MINUTES",
        );
        override_u64(&mut self.threat.max_retry, "LOGSMITH_THREAT_MAX_RETRY");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogsmithError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 유사도 임계값 검증
        if !(self.miner.similarity > 0.0 && self.miner.similarity <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "miner.similarity".to_owned(),
                reason: "must be within (0.0, 1.0]".to_owned(),
            }
            .into());
        }

        // 세션 설정 검증
        if self.session.stale_after_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.stale_after_hours".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        // 위협 탐지 설정 검증
        if self.threat.window_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threat.window_minutes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }
        if self.threat.max_retry == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threat.max_retry".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value = %value, "ignoring non-boolean env override"),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value = %value, "ignoring non-numeric env override"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *target = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }
}
