use serde::Deserialize;

use super::{parse_env_var, Result, SettingsError};
use crate::transaction::{MAX_ATTEMPTS, RETRY_DELAY};

/// 트랜잭션 재시도 예산
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 최대 시도 횟수
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 재시도 간격 (초)
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_max_attempts() -> u32 {
    MAX_ATTEMPTS
}

fn default_interval() -> u64 {
    RETRY_DELAY.as_secs()
}

impl RetrySettings {
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            max_attempts: parse_env_var("DATAPLANE_RETRY_MAX_ATTEMPTS", default_max_attempts)?,
            interval: parse_env_var("DATAPLANE_RETRY_INTERVAL", default_interval)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(SettingsError::InvalidConfig {
                field: "retry.max_attempts".to_string(),
                reason: "최소 1회 이상 시도해야 합니다".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval: default_interval(),
        }
    }
}
