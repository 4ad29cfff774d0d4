//! 에러 타입 -- 도메인별 에러 정의

/// Logsmith 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogsmithError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 분석 파이프라인 에러
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 분석 파이프라인 에러
///
/// 엔진 크레이트의 세부 에러는 이 타입으로 변환되어 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 입력 로그 파일을 읽을 수 없음 -- 실행 전체가 실패합니다
    #[error("input file not readable: {path}: {reason}")]
    InputUnreadable { path: String, reason: String },

    /// 클러스터링 엔진의 마이닝 실패 -- 줄 단위 fail-fast
    #[error("template mining failed: {0}")]
    Mining(String),

    /// 그 외 엔진 내부 에러
    #[error("analysis failed: {0}")]
    Failed(String),
}
