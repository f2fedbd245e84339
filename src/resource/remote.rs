use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Identity, Locator, ParentRef, ParentShape, ResourceId, ResourceKind};
use crate::provider::ResourceSchema;

/// 프레임워크 모델과 원격 페이로드를 잇는 리소스 능력 집합
///
/// 경로 템플릿과 부모 형태는 [`ResourceKind`]가, 페이로드 변환은 구현체가 맡습니다.
pub trait RemoteResource: Send + Sync + 'static {
    const KIND: ResourceKind;
    /// 호스트 프레임워크에 등록되는 타입 이름
    const TYPE_NAME: &'static str;

    /// 호스트 프레임워크가 넘겨주는 설정 스냅샷
    type Model: Serialize + DeserializeOwned + Clone + Send + Sync;
    /// Data Plane API 본문
    type Payload: Serialize + DeserializeOwned + Send + Sync;

    fn parent(model: &Self::Model) -> Option<ParentRef>;

    /// 싱글턴이면 `None`
    fn name(model: &Self::Model) -> Option<String>;

    fn to_payload(model: &Self::Model) -> Self::Payload;

    fn from_payload(payload: Self::Payload, parent: Option<&ParentRef>) -> Self::Model;

    fn schema() -> ResourceSchema;

    fn locator(model: &Self::Model) -> Locator {
        Locator::new(Self::KIND, Self::parent(model), Self::name(model).map(ResourceId::Name))
    }

    /// 가져오기 식별자를 해석합니다.
    ///
    /// 최상위 리소스는 `name`, 하위 리소스는 `parent/name` 형식입니다.
    fn import_locator(id: &str) -> Result<Locator, String> {
        if Self::KIND.identity() == Identity::Singleton {
            return Ok(Locator::singleton(Self::KIND));
        }

        match (Self::KIND.parent_shape(), id.split_once('/')) {
            (ParentShape::Root, None) if !id.is_empty() => Ok(Locator::named(Self::KIND, None, id)),
            (ParentShape::Exactly(kind), Some((parent, name))) if !parent.is_empty() && !name.is_empty() => {
                Ok(Locator::named(Self::KIND, Some(ParentRef::new(kind, parent)), name))
            }
            (ParentShape::Root, _) => Err(format!("{} 가져오기 식별자는 'name' 형식이어야 합니다: {}", Self::TYPE_NAME, id)),
            _ => Err(format!(
                "{} 가져오기 식별자는 'parent/name' 형식이어야 합니다: {}",
                Self::TYPE_NAME,
                id
            )),
        }
    }
}
