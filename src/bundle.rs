//! 서로 의존하는 리소스 묶음을 한 트랜잭션에서 순서대로 만들기
//!
//! server는 backend를 참조하고 frontend는 default_backend로 backend를
//! 참조하므로 backend, server, frontend 순서로 만듭니다. 제거는 그 반대입니다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataplane::{paths, ApiError, ConflictKind, DataPlaneClient, Transaction};
use crate::resource::proxy::{BackendModel, BackendPayload, FrontendModel, FrontendPayload, ServerModel, ServerPayload};
use crate::resource::{to_wire, Locator, ParentRef, ResourceKind};
use crate::transaction::{Retryable, UnitOfWork};

/// 부모가 지정된 server
#[derive(Debug, Clone, PartialEq)]
pub struct BundledServer {
    pub parent: ParentRef,
    pub server: ServerPayload,
}

impl BundledServer {
    fn locator(&self) -> Locator {
        Locator::named(ResourceKind::Server, Some(self.parent.clone()), self.server.name.clone())
    }
}

/// 한 번에 적용할 backend, server 목록, frontend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBundle {
    pub backend: Option<BackendPayload>,
    pub servers: Vec<BundledServer>,
    pub frontend: Option<FrontendPayload>,
}

impl ResourceBundle {
    /// 요청을 보내기 전에 모든 이름과 부모 형태를 검사합니다.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(backend) = &self.backend {
            paths::check(&Locator::named(ResourceKind::Backend, None, backend.name.clone()))?;
        }
        for entry in &self.servers {
            paths::check(&entry.locator())?;
        }
        if let Some(frontend) = &self.frontend {
            paths::check(&Locator::named(ResourceKind::Frontend, None, frontend.name.clone()))?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_none() && self.servers.is_empty() && self.frontend.is_none()
    }
}

/// 프레임워크 쪽 묶음 모델. 각 server는 자기 backend 이름을 가집니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackModel {
    pub backend: Option<BackendModel>,
    #[serde(default)]
    pub servers: Vec<ServerModel>,
    pub frontend: Option<FrontendModel>,
}

impl From<&StackModel> for ResourceBundle {
    fn from(model: &StackModel) -> Self {
        Self {
            backend: model.backend.as_ref().map(BackendPayload::from),
            servers: model
                .servers
                .iter()
                .map(|server| BundledServer {
                    parent: server.parent_ref(),
                    server: ServerPayload::from(server),
                })
                .collect(),
            frontend: model.frontend.as_ref().map(FrontendPayload::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("backend {name} 생성 실패: {source}")]
    Backend {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("server {parent}/{name} 생성 실패: {source}")]
    Server {
        parent: ParentRef,
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("frontend {name} 생성 실패: {source}")]
    Frontend {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BundleError {
    pub fn api_error(&self) -> &ApiError {
        match self {
            BundleError::Backend { source, .. }
            | BundleError::Server { source, .. }
            | BundleError::Frontend { source, .. }
            | BundleError::Api(source) => source,
        }
    }
}

impl Retryable for BundleError {
    fn conflict(&self) -> Option<ConflictKind> {
        self.api_error().conflict()
    }
}

/// 묶음을 의존 순서대로 만듭니다. 첫 실패에서 멈추고 그 오류를 돌려줍니다.
pub async fn apply_bundle(
    client: &dyn DataPlaneClient,
    transaction: &Transaction,
    bundle: &ResourceBundle,
) -> Result<(), BundleError> {
    bundle.validate()?;

    if let Some(backend) = &bundle.backend {
        let locator = Locator::named(ResourceKind::Backend, None, backend.name.clone());
        client
            .create(&locator, transaction, &to_wire(backend)?)
            .await
            .map_err(|source| BundleError::Backend {
                name: backend.name.clone(),
                source,
            })?;
        debug!(backend = %backend.name, "backend 생성");
    }

    for entry in &bundle.servers {
        client
            .create(&entry.locator(), transaction, &to_wire(&entry.server)?)
            .await
            .map_err(|source| BundleError::Server {
                parent: entry.parent.clone(),
                name: entry.server.name.clone(),
                source,
            })?;
        debug!(parent = %entry.parent, server = %entry.server.name, "server 생성");
    }

    if let Some(frontend) = &bundle.frontend {
        let locator = Locator::named(ResourceKind::Frontend, None, frontend.name.clone());
        client
            .create(&locator, transaction, &to_wire(frontend)?)
            .await
            .map_err(|source| BundleError::Frontend {
                name: frontend.name.clone(),
                source,
            })?;
        debug!(frontend = %frontend.name, "frontend 생성");
    }

    info!(
        backend = bundle.backend.is_some(),
        servers = bundle.servers.len(),
        frontend = bundle.frontend.is_some(),
        "리소스 묶음 적용"
    );
    Ok(())
}

/// 묶음을 역순(frontend, server, backend)으로 지웁니다. 이미 없는 객체는 건너뜁니다.
pub async fn remove_bundle(
    client: &dyn DataPlaneClient,
    transaction: &Transaction,
    bundle: &ResourceBundle,
) -> Result<(), BundleError> {
    bundle.validate()?;

    if let Some(frontend) = &bundle.frontend {
        let locator = Locator::named(ResourceKind::Frontend, None, frontend.name.clone());
        delete_if_present(client, transaction, &locator)
            .await
            .map_err(|source| BundleError::Frontend {
                name: frontend.name.clone(),
                source,
            })?;
    }

    for entry in bundle.servers.iter().rev() {
        delete_if_present(client, transaction, &entry.locator())
            .await
            .map_err(|source| BundleError::Server {
                parent: entry.parent.clone(),
                name: entry.server.name.clone(),
                source,
            })?;
    }

    if let Some(backend) = &bundle.backend {
        let locator = Locator::named(ResourceKind::Backend, None, backend.name.clone());
        delete_if_present(client, transaction, &locator)
            .await
            .map_err(|source| BundleError::Backend {
                name: backend.name.clone(),
                source,
            })?;
    }

    info!(servers = bundle.servers.len(), "리소스 묶음 제거");
    Ok(())
}

async fn delete_if_present(client: &dyn DataPlaneClient, transaction: &Transaction, locator: &Locator) -> Result<(), ApiError> {
    match client.delete(locator, transaction).await {
        Err(e) if e.is_not_found() => {
            debug!(locator = %locator, "이미 삭제됨");
            Ok(())
        }
        other => other,
    }
}

/// [`apply_bundle`]을 트랜잭션 작업으로 감쌉니다.
pub struct BundleApply {
    pub bundle: ResourceBundle,
}

#[async_trait]
impl UnitOfWork for BundleApply {
    type Output = ();
    type Error = BundleError;

    fn name(&self) -> String {
        "apply bundle".to_string()
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<(), BundleError> {
        apply_bundle(client, transaction, &self.bundle).await
    }
}

pub struct BundleRemoval {
    pub bundle: ResourceBundle,
}

#[async_trait]
impl UnitOfWork for BundleRemoval {
    type Output = ();
    type Error = BundleError;

    fn name(&self) -> String {
        "remove bundle".to_string()
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<(), BundleError> {
        remove_bundle(client, transaction, &self.bundle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_model_to_bundle() {
        let stack = StackModel {
            backend: Some(BackendModel {
                name: "api".to_string(),
                ..Default::default()
            }),
            servers: vec![ServerModel {
                backend: "api".to_string(),
                name: "s1".to_string(),
                address: "10.0.0.1".to_string(),
                ..Default::default()
            }],
            frontend: None,
        };

        let bundle = ResourceBundle::from(&stack);
        assert_eq!(bundle.servers[0].parent, ParentRef::backend("api"));
        assert!(bundle.validate().is_ok());
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_names_and_parents() {
        let bundle = ResourceBundle {
            servers: vec![BundledServer {
                parent: ParentRef::frontend("http-in"),
                server: ServerPayload {
                    name: "s1".to_string(),
                    address: "10.0.0.1".to_string(),
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        assert!(matches!(bundle.validate(), Err(ApiError::InvalidParent { .. })));

        let bundle = ResourceBundle {
            backend: Some(BackendPayload {
                name: "bad name".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(bundle.validate(), Err(ApiError::InvalidName { .. })));
    }

    #[test]
    fn test_conflict_propagates_through_bundle_error() {
        let error = BundleError::Server {
            parent: ParentRef::backend("api"),
            name: "s1".to_string(),
            source: ApiError::status("POST", "/x", 409, "10: version mismatch"),
        };
        assert_eq!(error.conflict(), Some(ConflictKind::VersionMismatch));
    }
}
