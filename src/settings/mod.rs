use std::{env, path::Path};
use serde::Deserialize;
use tracing::debug;

mod dataplane;
mod error;
pub mod logging;
pub mod retry;

pub use dataplane::DataPlaneSettings;
pub use error::SettingsError;
pub use logging::{LogFormat, LogOutput, LogSettings};
pub use retry::RetrySettings;

pub type Result<T> = std::result::Result<T, SettingsError>;

/// 설정 파일 경로를 지정하는 환경 변수
pub const CONFIG_FILE_ENV: &str = "DATAPLANE_CONFIG_FILE";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // Data Plane API 접속 설정
    #[serde(default)]
    pub dataplane: DataPlaneSettings,

    // 트랜잭션 재시도 설정
    #[serde(default)]
    pub retry: RetrySettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    /// `DATAPLANE_CONFIG_FILE`이 있으면 TOML 파일을, 없으면 환경 변수를 읽습니다.
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var(CONFIG_FILE_ENV) {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env()
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("설정 파일 로드: {}", path_ref.display());

        let content = tokio::fs::read_to_string(path_ref).await.map_err(|e| SettingsError::FileError {
            path: path_ref.to_string_lossy().to_string(),
            error: e,
        })?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        let settings = Self {
            dataplane: DataPlaneSettings::from_env()?,
            retry: RetrySettings::from_env()?,
            logging: LogSettings::from_env()?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.dataplane.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}
