use std::fs::OpenOptions;
use std::io;
use tracing::{debug, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::{LogFormat, LogOutput, LogSettings};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("로그 파일 {path} 열기 실패: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("로깅 초기화 실패: {0}")]
    Install(String),
}

/// 전역 tracing 구독자를 설치합니다.
///
/// 반환된 가드가 살아 있는 동안 버퍼링된 로그가 기록되므로 `main`이 끝날 때까지
/// 보관해야 합니다.
pub fn init_logging(settings: &LogSettings) -> Result<WorkerGuard, LoggingError> {
    let filter = EnvFilter::from_default_env()
        .add_directive(settings.level.into())
        .add_directive(
            "hyper=info"
                .parse()
                .map_err(|e| LoggingError::Install(format!("{}", e)))?,
        );

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File {
                    path: path.clone(),
                    source,
                })?;
            tracing_appender::non_blocking(file)
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let installed = match settings.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(guard)
}

/// Data Plane API 호출 한 건의 기록
#[derive(Debug)]
pub struct ApiCallLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub transaction_id: Option<String>,
    pub status_code: Option<u16>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ApiCallLog {
    pub fn new(method: &str, path: &str, transaction_id: Option<&str>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method: method.to_string(),
            path: path.to_string(),
            transaction_id: transaction_id.map(str::to_string),
            status_code: None,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn with_status(&mut self, status: u16) {
        self.status_code = Some(status);
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    fn level(&self) -> Level {
        match (self.error.as_ref(), self.status_code) {
            (Some(_), _) => Level::WARN,
            (None, Some(status)) if status >= 400 => Level::WARN,
            _ => Level::DEBUG,
        }
    }
}

pub fn log_api_call(log: &ApiCallLog) {
    match log.level() {
        Level::WARN => warn!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            transaction_id = ?log.transaction_id,
            status = ?log.status_code,
            duration_ms = log.duration_ms,
            error = ?log.error,
            "Data Plane API 호출 실패"
        ),
        _ => debug!(
            request_id = %log.request_id,
            method = %log.method,
            path = %log.path,
            transaction_id = ?log.transaction_id,
            status = ?log.status_code,
            duration_ms = log.duration_ms,
            "Data Plane API 호출 완료"
        ),
    }
}
