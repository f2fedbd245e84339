use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::handler::{decode, encode, fetch_model, Context, ResourceHandler};
use super::{Attribute, AttributeType, ProviderError, ResourceSchema};
use crate::bundle::{apply_bundle, remove_bundle, BundleApply, BundleError, BundleRemoval, ResourceBundle, StackModel};
use crate::dataplane::{ApiError, DataPlaneClient, Transaction};
use crate::resource::proxy::{BackendResource, FrontendResource, ServerModel, ServerResource};
use crate::resource::{from_wire, Locator, ParentRef, RemoteResource, ResourceKind};
use crate::transaction::UnitOfWork;

const TYPE_NAME: &str = "haproxy_stack";

/// 이전 묶음을 지우고 새 묶음을 만드는 것을 한 트랜잭션으로 처리합니다.
struct BundleReplace {
    prior: ResourceBundle,
    next: ResourceBundle,
}

#[async_trait]
impl UnitOfWork for BundleReplace {
    type Output = ();
    type Error = BundleError;

    fn name(&self) -> String {
        "replace bundle".to_string()
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<(), BundleError> {
        remove_bundle(client, transaction, &self.prior).await?;
        apply_bundle(client, transaction, &self.next).await
    }
}

/// backend, server 목록, frontend를 한 리소스로 묶은 `haproxy_stack`
#[derive(Default)]
pub struct StackHandler;

impl StackHandler {
    async fn fetch(&self, ctx: &Context<'_>, stack: &StackModel) -> Result<StackModel, ProviderError> {
        let backend = match &stack.backend {
            Some(backend) => {
                let locator = Locator::named(ResourceKind::Backend, None, backend.name.clone());
                fetch_model::<BackendResource>(ctx, &locator).await?
            }
            None => None,
        };

        let mut servers = Vec::with_capacity(stack.servers.len());
        for server in &stack.servers {
            let locator = Locator::named(ResourceKind::Server, Some(server.parent_ref()), server.name.clone());
            if let Some(model) = fetch_model::<ServerResource>(ctx, &locator).await? {
                servers.push(model);
            }
        }

        let frontend = match &stack.frontend {
            Some(frontend) => {
                let locator = Locator::named(ResourceKind::Frontend, None, frontend.name.clone());
                fetch_model::<FrontendResource>(ctx, &locator).await?
            }
            None => None,
        };

        Ok(StackModel {
            backend,
            servers,
            frontend,
        })
    }

    fn prepare(&self, snapshot: Value) -> Result<(StackModel, ResourceBundle), ProviderError> {
        let stack: StackModel = decode(TYPE_NAME, snapshot)?;
        let bundle = ResourceBundle::from(&stack);
        bundle.validate()?;
        Ok((stack, bundle))
    }
}

fn is_empty(stack: &StackModel) -> bool {
    stack.backend.is_none() && stack.servers.is_empty() && stack.frontend.is_none()
}

#[async_trait]
impl ResourceHandler for StackHandler {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        let object = |schema: ResourceSchema| AttributeType::Object(schema.attributes);

        ResourceSchema::new(TYPE_NAME).with_attributes([
            Attribute::optional("backend", object(BackendResource::schema())),
            Attribute::optional("servers", Attribute::list_of(object(ServerResource::schema())))
                .describe("backend 다음, frontend 전에 순서대로 생성"),
            Attribute::optional("frontend", object(FrontendResource::schema())),
        ])
    }

    async fn create(&self, ctx: &Context<'_>, plan: Value) -> Result<Value, ProviderError> {
        let (stack, bundle) = self.prepare(plan)?;

        ctx.run(&BundleApply { bundle })
            .await
            .map_err(|e| ProviderError::transaction(TYPE_NAME, e))?;
        info!(servers = stack.servers.len(), "스택 생성");

        encode(&self.fetch(ctx, &stack).await?)
    }

    async fn read(&self, ctx: &Context<'_>, state: Value) -> Result<Option<Value>, ProviderError> {
        let (stack, _) = self.prepare(state)?;
        let remote = self.fetch(ctx, &stack).await?;

        if is_empty(&remote) {
            warn!("스택의 모든 객체가 원격에서 사라짐");
            return Ok(None);
        }
        Ok(Some(encode(&remote)?))
    }

    async fn update(&self, ctx: &Context<'_>, prior: Value, plan: Value) -> Result<Value, ProviderError> {
        let (_, prior) = self.prepare(prior)?;
        let (stack, next) = self.prepare(plan)?;

        ctx.run(&BundleReplace { prior, next })
            .await
            .map_err(|e| ProviderError::transaction(TYPE_NAME, e))?;
        info!(servers = stack.servers.len(), "스택 교체");

        encode(&self.fetch(ctx, &stack).await?)
    }

    async fn delete(&self, ctx: &Context<'_>, state: Value) -> Result<(), ProviderError> {
        let (_, bundle) = self.prepare(state)?;

        ctx.run(&BundleRemoval { bundle })
            .await
            .map_err(|e| ProviderError::transaction(TYPE_NAME, e))?;
        info!("스택 삭제");
        Ok(())
    }

    /// 식별자는 backend 이름입니다. backend의 모든 server와 같은 이름의 frontend를 가져옵니다.
    async fn import(&self, ctx: &Context<'_>, id: &str) -> Result<Option<Value>, ProviderError> {
        let backend_locator = BackendResource::import_locator(id).map_err(|reason| ProviderError::InvalidImportId {
            type_name: TYPE_NAME.to_string(),
            reason,
        })?;
        let Some(backend) = fetch_model::<BackendResource>(ctx, &backend_locator).await? else {
            return Ok(None);
        };

        let parent = ParentRef::backend(backend.name.clone());
        let servers = ctx
            .request(TYPE_NAME, ctx.client().list(ResourceKind::Server, Some(&parent), None))
            .await?
            .into_iter()
            .map(|value| from_wire(value, ServerResource::TYPE_NAME).map(|p| ServerModel::from_payload(&backend.name, p)))
            .collect::<Result<Vec<_>, ApiError>>()?;

        let frontend_locator = Locator::named(ResourceKind::Frontend, None, backend.name.clone());
        let frontend = fetch_model::<FrontendResource>(ctx, &frontend_locator)
            .await?
            .filter(|f| f.default_backend.as_deref() == Some(backend.name.as_str()));

        let stack = StackModel {
            backend: Some(backend),
            servers,
            frontend,
        };
        Ok(Some(encode(&stack)?))
    }
}
