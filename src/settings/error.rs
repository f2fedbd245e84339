/// Data Plane API 연결, 재시도, 로그 설정을 읽거나 검증하다 생긴 오류
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("필수 환경 변수 {var_name}가 없습니다")]
    EnvVarMissing { var_name: String },

    #[error("환경 변수 {var_name}의 값 '{value}'을 쓸 수 없습니다: {reason}")]
    EnvVarInvalid {
        var_name: String,
        value: String,
        reason: String,
    },

    #[error("Data Plane 설정 파일 {path}을 읽을 수 없습니다: {error}")]
    FileError {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Data Plane 설정 파일 형식 오류: {source}")]
    ParseError { source: toml::de::Error },

    #[error("Data Plane 설정 {field} 값이 올바르지 않습니다: {reason}")]
    InvalidConfig { field: String, reason: String },
}
