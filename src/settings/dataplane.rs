use serde::Deserialize;
use std::fmt;
use url::Url;

use super::{parse_env_var, Result, SettingsError};

/// Data Plane API 접속 설정
#[derive(Clone, Deserialize)]
pub struct DataPlaneSettings {
    /// API 주소 (기본값: http://127.0.0.1:5555)
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic 인증 사용자
    #[serde(default = "default_username")]
    pub username: String,

    /// Basic 인증 비밀번호
    #[serde(default)]
    pub password: String,

    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

// 비밀번호는 로그에 남기지 않는다
impl fmt::Debug for DataPlaneSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPlaneSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn default_url() -> String {
    "http://127.0.0.1:5555".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl DataPlaneSettings {
    pub fn from_env() -> Result<Self> {
        let password = std::env::var("DATAPLANE_PASSWORD").map_err(|_| SettingsError::EnvVarMissing {
            var_name: "DATAPLANE_PASSWORD".to_string(),
        })?;

        let settings = Self {
            url: parse_env_var("DATAPLANE_URL", default_url)?,
            username: parse_env_var("DATAPLANE_USERNAME", default_username)?,
            password,
            timeout: parse_env_var("DATAPLANE_TIMEOUT", default_timeout)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url).map_err(|e| SettingsError::InvalidConfig {
            field: "dataplane.url".to_string(),
            reason: e.to_string(),
        })?;

        // hyper 커넥터는 평문 HTTP만 다룬다
        if url.scheme() != "http" {
            return Err(SettingsError::InvalidConfig {
                field: "dataplane.url".to_string(),
                reason: format!("http 주소만 지원합니다: {}", self.url),
            });
        }

        if self.username.is_empty() {
            return Err(SettingsError::InvalidConfig {
                field: "dataplane.username".to_string(),
                reason: "사용자 이름은 비어있을 수 없습니다".to_string(),
            });
        }

        if self.password.is_empty() {
            return Err(SettingsError::InvalidConfig {
                field: "dataplane.password".to_string(),
                reason: "비밀번호는 비어있을 수 없습니다".to_string(),
            });
        }

        if self.timeout == 0 {
            return Err(SettingsError::InvalidConfig {
                field: "dataplane.timeout".to_string(),
                reason: "타임아웃은 0이 될 수 없습니다".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DataPlaneSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: String::new(),
            timeout: default_timeout(),
        }
    }
}
