use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{info, warn};

use super::handler::{decode, encode, Context, ResourceHandler};
use super::{Attribute, AttributeType, ProviderError, ResourceSchema};
use crate::dataplane::paths;
use crate::reconcile::{list_children, OrderedChild, ReconcileChildren, ReconcileError};
use crate::resource::{ParentKind, ParentRef};
use crate::transaction::TransactionError;

/// 부모 하나 아래의 순서 있는 목록 전체를 하나의 리소스로 다룹니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionModel<T> {
    pub parent_type: ParentKind,
    pub parent_name: String,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> CollectionModel<T> {
    pub fn parent(&self) -> ParentRef {
        ParentRef::new(self.parent_type, self.parent_name.clone())
    }
}

pub struct CollectionHandler<T>(PhantomData<T>);

impl<T: OrderedChild> CollectionHandler<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    fn parent_of(&self, snapshot: Value) -> Result<CollectionModel<T>, ProviderError> {
        let model: CollectionModel<T> = decode(T::TYPE_NAME, snapshot)?;
        paths::collection(T::KIND, Some(&model.parent()))?;
        Ok(model)
    }

    async fn fetch(&self, ctx: &Context<'_>, parent: &ParentRef) -> Result<Option<Value>, ProviderError> {
        let Some(items) = ctx
            .lookup(T::TYPE_NAME, list_children::<T>(ctx.client(), parent, None))
            .await?
        else {
            return Ok(None);
        };
        let model = CollectionModel {
            parent_type: parent.kind,
            parent_name: parent.name.clone(),
            items,
        };
        Ok(Some(encode(&model)?))
    }

    async fn reconcile(&self, ctx: &Context<'_>, model: CollectionModel<T>) -> Result<Value, ProviderError> {
        let parent = model.parent();
        let report = ctx
            .run(&ReconcileChildren::new(parent.clone(), model.items.clone()))
            .await
            .map_err(|e| ProviderError::transaction(T::TYPE_NAME, e))?;
        info!(
            kind = %T::KIND,
            parent = %parent,
            deleted = report.deleted.len(),
            updated = report.updated.len(),
            created = report.created.len(),
            "목록 반영"
        );

        match self.fetch(ctx, &parent).await? {
            Some(state) => Ok(state),
            None => encode(&model),
        }
    }
}

impl<T: OrderedChild> Default for CollectionHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_missing(error: &TransactionError<ReconcileError>) -> bool {
    matches!(error.last_error(), Some(ReconcileError::Api(e)) if e.is_not_found())
}

#[async_trait]
impl<T: OrderedChild> ResourceHandler for CollectionHandler<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(T::TYPE_NAME).with_attributes([
            Attribute::required("parent_type", AttributeType::String).force_new(),
            Attribute::required("parent_name", AttributeType::String).force_new(),
            Attribute::optional("items", Attribute::list_of(AttributeType::Object(T::item_schema())))
                .describe("순서대로 적용되는 항목"),
        ])
    }

    async fn create(&self, ctx: &Context<'_>, plan: Value) -> Result<Value, ProviderError> {
        let model = self.parent_of(plan)?;
        self.reconcile(ctx, model).await
    }

    async fn read(&self, ctx: &Context<'_>, state: Value) -> Result<Option<Value>, ProviderError> {
        let model = self.parent_of(state)?;
        let parent = model.parent();
        let state = self.fetch(ctx, &parent).await?;
        if state.is_none() {
            warn!(parent = %parent, kind = %T::KIND, "부모가 사라져 목록을 상태에서 제거");
        }
        Ok(state)
    }

    async fn update(&self, ctx: &Context<'_>, _prior: Value, plan: Value) -> Result<Value, ProviderError> {
        let model = self.parent_of(plan)?;
        self.reconcile(ctx, model).await
    }

    async fn delete(&self, ctx: &Context<'_>, state: Value) -> Result<(), ProviderError> {
        let model = self.parent_of(state)?;
        let parent = model.parent();

        match ctx.run(&ReconcileChildren::<T>::new(parent.clone(), Vec::new())).await {
            Ok(report) => {
                info!(parent = %parent, kind = %T::KIND, deleted = report.deleted.len(), "목록 비움");
                Ok(())
            }
            Err(e) if parent_missing(&e) => {
                warn!(parent = %parent, kind = %T::KIND, "부모가 이미 삭제됨");
                Ok(())
            }
            Err(e) => Err(ProviderError::transaction(T::TYPE_NAME, e)),
        }
    }

    /// 식별자는 `parent_kind/parent` 형식입니다. (예: `backend/api`)
    async fn import(&self, ctx: &Context<'_>, id: &str) -> Result<Option<Value>, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidImportId {
            type_name: T::TYPE_NAME.to_string(),
            reason,
        };

        let (kind, name) = id
            .split_once('/')
            .filter(|(_, name)| !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| invalid(format!("'parent_kind/parent' 형식이어야 합니다: {}", id)))?;
        let parent = ParentRef::new(kind.parse::<ParentKind>().map_err(invalid)?, name);
        paths::collection(T::KIND, Some(&parent))?;

        self.fetch(ctx, &parent).await
    }
}
