use serde::{Deserialize, Deserializer};
use std::env;
use tracing::Level;
use super::{parse_env_var, SettingsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 로그 출력 대상. 호스트 프레임워크가 stdout을 쓰는 경우가 많아 기본값은 stderr.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File(String),
}

impl std::str::FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "" => Err("로그 출력 경로가 비어 있습니다".to_string()),
            _ => Ok(LogOutput::File(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for LogOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: Level,
    pub output: LogOutput,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let level = env::var("DATAPLANE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Ok(Self {
            format: parse_env_var("DATAPLANE_LOG_FORMAT", LogFormat::default)?,
            level: parse_log_level(&level).ok_or_else(|| SettingsError::EnvVarInvalid {
                var_name: "DATAPLANE_LOG_LEVEL".to_string(),
                value: level.clone(),
                reason: "유효하지 않은 로그 레벨".to_string(),
            })?,
            output: parse_env_var("DATAPLANE_LOG_OUTPUT", LogOutput::default)?,
        })
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: Level::INFO,
            output: LogOutput::default(),
        }
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for LogSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            format: LogFormat,
            #[serde(default = "default_log_level_string")]
            level: String,
            #[serde(default)]
            output: LogOutput,
        }

        let helper = Helper::deserialize(deserializer)?;
        let level = parse_log_level(&helper.level).ok_or_else(|| {
            serde::de::Error::custom(format!("유효하지 않은 로그 레벨: {}", helper.level))
        })?;

        Ok(LogSettings {
            format: helper.format,
            level,
            output: helper.output,
        })
    }
}

fn default_log_level_string() -> String {
    "info".to_string()
}
