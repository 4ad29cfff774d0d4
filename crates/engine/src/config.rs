//! 분석 엔진 설정
//!
//! [`AnalyzerConfig`]는 core의 [`LogsmithConfig`](logsmith_core::config::LogsmithConfig)에서
//! 엔진이 사용하는 섹션만 모아 제공합니다.
//!
//! # 사용 예시
//! ```
//! use logsmith_core::config::LogsmithConfig;
//! use logsmith_engine::config::AnalyzerConfig;
//!
//! let core_config = LogsmithConfig::default();
//! let config = AnalyzerConfig::from_core(&core_config);
//! assert_eq!(config.threat.max_retry, 5);
//! ```

use logsmith_core::config::{LogsmithConfig, MinerConfig, NoiseConfig, SessionConfig, ThreatConfig};
use serde::{Deserialize, Serialize};

/// 분석 엔진 설정
///
/// core 설정의 엔진 관련 섹션에 실행 단위 확장 필드를 더한 형태입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// 노이즈 프리필터 설정
    pub noise: NoiseConfig,
    /// 기본 템플릿 마이너 설정
    pub miner: MinerConfig,
    /// 세션 상관 분석 설정
    pub session: SessionConfig,
    /// 위협 탐지 설정
    pub threat: ThreatConfig,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 로그에 명시적 연도가 없을 때 사용할 앵커 연도
    ///
    /// None이면 현재 달력 연도를 사용합니다. 테스트에서 결정적
    /// 동작이 필요할 때 고정값을 주입합니다.
    pub fallback_year: Option<i32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            miner: MinerConfig::default(),
            session: SessionConfig::default(),
            threat: ThreatConfig::default(),
            fallback_year: None,
        }
    }
}

impl AnalyzerConfig {
    /// core의 `LogsmithConfig`에서 엔진 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &LogsmithConfig) -> Self {
        Self {
            noise: core.noise.clone(),
            miner: core.miner.clone(),
            session: core.session.clone(),
            threat: core.threat.clone(),
            ..Self::default()
        }
    }
}
