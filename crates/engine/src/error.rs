//! 엔진 에러 타입
//!
//! [`EngineError`]는 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<EngineError> for LogsmithError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logsmith_core::error::{AnalysisError, LogsmithError};

/// 엔진 도메인 에러
///
/// 대부분의 줄 단위 문제(추출 실패 등)는 에러가 아니라 축소된
/// 메타데이터로 처리됩니다. 이 타입은 구성 단계의 실패
/// (규칙 컴파일, 잘못된 설정)를 다룹니다.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 재작성 규칙 컴파일 실패
    #[error("rewrite rule '{rule}' failed to compile: {reason}")]
    RuleCompile {
        /// 문제가 된 규칙 이름
        rule: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 엔진 설정 에러
    #[error("engine config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<EngineError> for LogsmithError {
    fn from(err: EngineError) -> Self {
        LogsmithError::Analysis(AnalysisError::Failed(err.to_string()))
    }
}
