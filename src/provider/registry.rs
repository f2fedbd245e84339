use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::collection::CollectionHandler;
use super::handler::{Context, NamedResourceHandler, ResourceHandler};
use super::stack::StackHandler;
use super::{Diagnostic, ProviderError, ResourceSchema};
use crate::dataplane::{ApiError, DataPlaneClient, HttpDataPlaneClient};
use crate::resource::proxy::{BackendResource, BindResource, FrontendResource, ServerResource};
use crate::resource::rules::{Acl, HttpCheck, HttpRequestRule, HttpResponseRule, TcpCheck, TcpRequestRule, TcpResponseRule};
use crate::resource::sections::{
    GlobalResource, NameserverResource, PeerEntryResource, PeerSectionResource, ResolverResource,
};
use crate::settings::Settings;
use crate::transaction::{RetryPolicy, TransactionCoordinator};

/// 리소스 타입 이름으로 핸들러를 찾아 호출하는 진입점
///
/// 호스트 프레임워크는 스냅샷을 JSON으로 넘기고, 실패하면 [`Diagnostic`]을 받습니다.
pub struct Provider {
    coordinator: TransactionCoordinator,
    handlers: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
}

impl Provider {
    pub fn new(client: Arc<dyn DataPlaneClient>, policy: RetryPolicy) -> Self {
        let mut provider = Self {
            coordinator: TransactionCoordinator::new(client, policy),
            handlers: BTreeMap::new(),
        };

        provider.register(NamedResourceHandler::<GlobalResource>::new());
        provider.register(NamedResourceHandler::<FrontendResource>::new());
        provider.register(NamedResourceHandler::<BackendResource>::new());
        provider.register(NamedResourceHandler::<ServerResource>::new());
        provider.register(NamedResourceHandler::<BindResource>::new());
        provider.register(NamedResourceHandler::<ResolverResource>::new());
        provider.register(NamedResourceHandler::<NameserverResource>::new());
        provider.register(NamedResourceHandler::<PeerSectionResource>::new());
        provider.register(NamedResourceHandler::<PeerEntryResource>::new());

        provider.register(CollectionHandler::<Acl>::new());
        provider.register(CollectionHandler::<HttpRequestRule>::new());
        provider.register(CollectionHandler::<HttpResponseRule>::new());
        provider.register(CollectionHandler::<TcpRequestRule>::new());
        provider.register(CollectionHandler::<TcpResponseRule>::new());
        provider.register(CollectionHandler::<TcpCheck>::new());
        provider.register(CollectionHandler::<HttpCheck>::new());

        provider.register(StackHandler);
        provider
    }

    /// 설정으로 HTTP 게이트웨이를 만들어 연결합니다.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let client = HttpDataPlaneClient::new(&settings.dataplane)?;
        Ok(Self::new(Arc::new(client), RetryPolicy::from(&settings.retry)))
    }

    fn register(&mut self, handler: impl ResourceHandler + 'static) {
        debug!(resource_type = handler.type_name(), "리소스 타입 등록");
        self.handlers.insert(handler.type_name(), Box::new(handler));
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn schemas(&self) -> Vec<ResourceSchema> {
        self.handlers.values().map(|h| h.schema()).collect()
    }

    fn handler(&self, type_name: &str) -> Result<&dyn ResourceHandler, ProviderError> {
        self.handlers
            .get(type_name)
            .map(|h| h.as_ref())
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    fn context<'a>(&'a self, cancel: &'a CancellationToken) -> Context<'a> {
        Context::new(&self.coordinator, cancel)
    }

    #[instrument(skip(self, cancel, plan))]
    pub async fn create(&self, cancel: &CancellationToken, type_name: &str, plan: Value) -> Result<Value, Diagnostic> {
        let result = match self.handler(type_name) {
            Ok(handler) => handler.create(&self.context(cancel), plan).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Diagnostic::from_error(format!("{} 생성 실패", type_name), &e))
    }

    #[instrument(skip(self, cancel, state))]
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        type_name: &str,
        state: Value,
    ) -> Result<Option<Value>, Diagnostic> {
        let result = match self.handler(type_name) {
            Ok(handler) => handler.read(&self.context(cancel), state).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Diagnostic::from_error(format!("{} 조회 실패", type_name), &e))
    }

    #[instrument(skip(self, cancel, prior, plan))]
    pub async fn update(
        &self,
        cancel: &CancellationToken,
        type_name: &str,
        prior: Value,
        plan: Value,
    ) -> Result<Value, Diagnostic> {
        let result = match self.handler(type_name) {
            Ok(handler) => handler.update(&self.context(cancel), prior, plan).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Diagnostic::from_error(format!("{} 갱신 실패", type_name), &e))
    }

    #[instrument(skip(self, cancel, state))]
    pub async fn delete(&self, cancel: &CancellationToken, type_name: &str, state: Value) -> Result<(), Diagnostic> {
        let result = match self.handler(type_name) {
            Ok(handler) => handler.delete(&self.context(cancel), state).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Diagnostic::from_error(format!("{} 삭제 실패", type_name), &e))
    }

    #[instrument(skip(self, cancel))]
    pub async fn import(&self, cancel: &CancellationToken, type_name: &str, id: &str) -> Result<Option<Value>, Diagnostic> {
        let result = match self.handler(type_name) {
            Ok(handler) => handler.import(&self.context(cancel), id).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| Diagnostic::from_error(format!("{} 가져오기 실패", type_name), &e))
    }
}
