//! 리소스 종류, 원격 페이로드, 프레임워크 모델 변환

mod kind;
mod name;
pub mod proxy;
pub mod remote;
pub mod rules;
pub mod sections;

pub use kind::{Identity, Locator, ParentKind, ParentRef, ParentShape, ResourceId, ResourceKind};
pub use name::validate_name;
pub use remote::RemoteResource;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::dataplane::ApiError;

/// 원격 API가 쓰는 "enabled"/"disabled" 표기
pub(crate) fn to_flag(enabled: bool) -> Option<String> {
    Some(if enabled { "enabled" } else { "disabled" }.to_string())
}

pub(crate) fn from_flag(flag: Option<&str>) -> bool {
    flag == Some("enabled")
}

pub(crate) fn to_wire<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|source| ApiError::Encode { source })
}

pub(crate) fn from_wire<T: DeserializeOwned>(value: Value, context: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        context: context.to_string(),
        source,
    })
}
