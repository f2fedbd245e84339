//! Data Plane API v3 경로 템플릿

use super::ApiError;
use crate::resource::{validate_name, Identity, Locator, ParentRef, ResourceId, ResourceKind};

pub const API_ROOT: &str = "/v3/services/haproxy";

pub fn configuration_version() -> String {
    format!("{}/configuration/version", API_ROOT)
}

pub fn transactions() -> String {
    format!("{}/transactions", API_ROOT)
}

pub fn transaction(id: &str) -> String {
    format!("{}/transactions/{}", API_ROOT, id)
}

/// 부모 형태를 검사한 뒤 컬렉션 경로를 만듭니다.
pub fn collection(kind: ResourceKind, parent: Option<&ParentRef>) -> Result<String, ApiError> {
    if !kind.parent_shape().accepts(parent) {
        return Err(ApiError::InvalidParent {
            kind,
            parent: parent.map_or_else(|| "(없음)".to_string(), |p| p.to_string()),
        });
    }

    match parent {
        Some(parent) => {
            validate_name(&parent.name)?;
            Ok(format!(
                "{}/configuration/{}/{}/{}",
                API_ROOT,
                parent.kind.segment(),
                parent.name,
                kind.segment()
            ))
        }
        None => Ok(format!("{}/configuration/{}", API_ROOT, kind.segment())),
    }
}

/// 단일 객체 경로. 싱글턴은 컬렉션 경로와 같습니다.
pub fn item(locator: &Locator) -> Result<String, ApiError> {
    let base = collection(locator.kind, locator.parent.as_ref())?;

    match (locator.kind.identity(), &locator.id) {
        (Identity::Singleton, _) => Ok(base),
        (Identity::Named, Some(ResourceId::Name(name))) => {
            validate_name(name)?;
            Ok(format!("{}/{}", base, name))
        }
        (Identity::Indexed, Some(ResourceId::Index(index))) => Ok(format!("{}/{}", base, index)),
        _ => Err(ApiError::InvalidLocator {
            kind: locator.kind,
            locator: locator.to_string(),
        }),
    }
}

/// 요청을 보내기 전에 부모 형태와 이름을 검사합니다.
pub fn check(locator: &Locator) -> Result<(), ApiError> {
    item(locator).map(|_| ())
}
