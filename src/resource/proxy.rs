//! frontend, backend, server, bind

use serde::{Deserialize, Serialize};

use super::{from_flag, to_flag, ParentRef, RemoteResource, ResourceKind};
use crate::provider::{Attribute, AttributeType, ResourceSchema};

// ---------------------------------------------------------------------------
// frontend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub httplog: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendModel {
    pub name: String,
    pub mode: Option<String>,
    pub default_backend: Option<String>,
    pub max_connections: Option<u64>,
    #[serde(default)]
    pub http_log: bool,
    pub client_timeout_ms: Option<u64>,
    pub description: Option<String>,
}

impl From<&FrontendModel> for FrontendPayload {
    fn from(model: &FrontendModel) -> Self {
        Self {
            name: model.name.clone(),
            mode: model.mode.clone(),
            default_backend: model.default_backend.clone(),
            maxconn: model.max_connections,
            httplog: model.http_log.then_some(true),
            client_timeout: model.client_timeout_ms,
            description: model.description.clone(),
        }
    }
}

impl From<FrontendPayload> for FrontendModel {
    fn from(payload: FrontendPayload) -> Self {
        Self {
            name: payload.name,
            mode: payload.mode,
            default_backend: payload.default_backend,
            max_connections: payload.maxconn,
            http_log: payload.httplog.unwrap_or(false),
            client_timeout_ms: payload.client_timeout,
            description: payload.description,
        }
    }
}

pub struct FrontendResource;

impl RemoteResource for FrontendResource {
    const KIND: ResourceKind = ResourceKind::Frontend;
    const TYPE_NAME: &'static str = "haproxy_frontend";
    type Model = FrontendModel;
    type Payload = FrontendPayload;

    fn parent(_: &FrontendModel) -> Option<ParentRef> {
        None
    }

    fn name(model: &FrontendModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &FrontendModel) -> FrontendPayload {
        model.into()
    }

    fn from_payload(payload: FrontendPayload, _: Option<&ParentRef>) -> FrontendModel {
        payload.into()
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::optional("mode", AttributeType::String).describe("http 또는 tcp"),
            Attribute::optional("default_backend", AttributeType::String),
            Attribute::optional("max_connections", AttributeType::Number),
            Attribute::optional("http_log", AttributeType::Bool),
            Attribute::optional("client_timeout_ms", AttributeType::Number),
            Attribute::optional("description", AttributeType::String),
        ])
    }
}

// ---------------------------------------------------------------------------
// backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub algorithm: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StickTablePayload {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adv_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stick_table: Option<StickTablePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// backend에 붙는 stick-table 선언
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StickTableModel {
    pub table_type: String,
    pub size: String,
    pub expire: Option<String>,
    pub peers: Option<String>,
    #[serde(default)]
    pub store: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendModel {
    pub name: String,
    pub mode: Option<String>,
    pub balance_algorithm: Option<String>,
    pub check_type: Option<String>,
    pub server_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub stick_table: Option<StickTableModel>,
    pub description: Option<String>,
}

impl From<&StickTableModel> for StickTablePayload {
    fn from(model: &StickTableModel) -> Self {
        Self {
            table_type: Some(model.table_type.clone()),
            size: Some(model.size.clone()),
            expire: model.expire.clone(),
            peers: model.peers.clone(),
            store: (!model.store.is_empty()).then(|| model.store.join(",")),
        }
    }
}

impl From<StickTablePayload> for StickTableModel {
    fn from(payload: StickTablePayload) -> Self {
        Self {
            table_type: payload.table_type.unwrap_or_default(),
            size: payload.size.unwrap_or_default(),
            expire: payload.expire,
            peers: payload.peers,
            store: payload
                .store
                .map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<&BackendModel> for BackendPayload {
    fn from(model: &BackendModel) -> Self {
        Self {
            name: model.name.clone(),
            mode: model.mode.clone(),
            balance: model.balance_algorithm.clone().map(|algorithm| Balance { algorithm }),
            adv_check: model.check_type.clone(),
            server_timeout: model.server_timeout_ms,
            connect_timeout: model.connect_timeout_ms,
            stick_table: model.stick_table.as_ref().map(StickTablePayload::from),
            description: model.description.clone(),
        }
    }
}

impl From<BackendPayload> for BackendModel {
    fn from(payload: BackendPayload) -> Self {
        Self {
            name: payload.name,
            mode: payload.mode,
            balance_algorithm: payload.balance.map(|b| b.algorithm),
            check_type: payload.adv_check,
            server_timeout_ms: payload.server_timeout,
            connect_timeout_ms: payload.connect_timeout,
            stick_table: payload.stick_table.map(StickTableModel::from),
            description: payload.description,
        }
    }
}

pub struct BackendResource;

impl RemoteResource for BackendResource {
    const KIND: ResourceKind = ResourceKind::Backend;
    const TYPE_NAME: &'static str = "haproxy_backend";
    type Model = BackendModel;
    type Payload = BackendPayload;

    fn parent(_: &BackendModel) -> Option<ParentRef> {
        None
    }

    fn name(model: &BackendModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &BackendModel) -> BackendPayload {
        model.into()
    }

    fn from_payload(payload: BackendPayload, _: Option<&ParentRef>) -> BackendModel {
        payload.into()
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::optional("mode", AttributeType::String),
            Attribute::optional("balance_algorithm", AttributeType::String).describe("roundrobin, leastconn, source ..."),
            Attribute::optional("check_type", AttributeType::String).describe("tcp-check, httpchk ..."),
            Attribute::optional("server_timeout_ms", AttributeType::Number),
            Attribute::optional("connect_timeout_ms", AttributeType::Number),
            Attribute::optional(
                "stick_table",
                AttributeType::Object(vec![
                    Attribute::required("table_type", AttributeType::String),
                    Attribute::required("size", AttributeType::String),
                    Attribute::optional("expire", AttributeType::String),
                    Attribute::optional("peers", AttributeType::String),
                    Attribute::optional("store", Attribute::list_of(AttributeType::String)),
                ]),
            ),
            Attribute::optional("description", AttributeType::String),
        ])
    }
}

// ---------------------------------------------------------------------------
// server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerPayload {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerModel {
    /// 소속 backend 이름
    pub backend: String,
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub check: bool,
    pub weight: Option<u32>,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub ssl: bool,
    pub max_connections: Option<u64>,
    pub check_interval_ms: Option<u64>,
}

impl From<&ServerModel> for ServerPayload {
    fn from(model: &ServerModel) -> Self {
        Self {
            name: model.name.clone(),
            address: model.address.clone(),
            port: model.port,
            check: to_flag(model.check),
            weight: model.weight,
            backup: to_flag(model.backup),
            maintenance: to_flag(model.maintenance),
            ssl: to_flag(model.ssl),
            maxconn: model.max_connections,
            inter: model.check_interval_ms,
        }
    }
}

impl ServerModel {
    pub fn from_payload(backend: &str, payload: ServerPayload) -> Self {
        Self {
            backend: backend.to_string(),
            name: payload.name,
            address: payload.address,
            port: payload.port,
            check: from_flag(payload.check.as_deref()),
            weight: payload.weight,
            backup: from_flag(payload.backup.as_deref()),
            maintenance: from_flag(payload.maintenance.as_deref()),
            ssl: from_flag(payload.ssl.as_deref()),
            max_connections: payload.maxconn,
            check_interval_ms: payload.inter,
        }
    }

    pub fn parent_ref(&self) -> ParentRef {
        ParentRef::backend(self.backend.clone())
    }
}

pub struct ServerResource;

impl RemoteResource for ServerResource {
    const KIND: ResourceKind = ResourceKind::Server;
    const TYPE_NAME: &'static str = "haproxy_server";
    type Model = ServerModel;
    type Payload = ServerPayload;

    fn parent(model: &ServerModel) -> Option<ParentRef> {
        Some(model.parent_ref())
    }

    fn name(model: &ServerModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &ServerModel) -> ServerPayload {
        model.into()
    }

    fn from_payload(payload: ServerPayload, parent: Option<&ParentRef>) -> ServerModel {
        ServerModel::from_payload(parent.map(|p| p.name.as_str()).unwrap_or_default(), payload)
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("backend", AttributeType::String).force_new(),
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::required("address", AttributeType::String),
            Attribute::optional("port", AttributeType::Number),
            Attribute::optional("check", AttributeType::Bool),
            Attribute::optional("weight", AttributeType::Number),
            Attribute::optional("backup", AttributeType::Bool),
            Attribute::optional("maintenance", AttributeType::Bool),
            Attribute::optional("ssl", AttributeType::Bool),
            Attribute::optional("max_connections", AttributeType::Number),
            Attribute::optional("check_interval_ms", AttributeType::Number),
        ])
    }
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindModel {
    /// 소속 frontend 이름
    pub frontend: String,
    pub name: String,
    pub address: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub ssl: bool,
    pub ssl_certificate: Option<String>,
    #[serde(default)]
    pub alpn: Vec<String>,
    pub max_connections: Option<u64>,
}

impl From<&BindModel> for BindPayload {
    fn from(model: &BindModel) -> Self {
        Self {
            name: model.name.clone(),
            address: model.address.clone(),
            port: model.port,
            ssl: model.ssl.then_some(true),
            ssl_certificate: model.ssl_certificate.clone(),
            alpn: (!model.alpn.is_empty()).then(|| model.alpn.join(",")),
            maxconn: model.max_connections,
        }
    }
}

impl BindModel {
    pub fn from_payload(frontend: &str, payload: BindPayload) -> Self {
        Self {
            frontend: frontend.to_string(),
            name: payload.name,
            address: payload.address,
            port: payload.port,
            ssl: payload.ssl.unwrap_or(false),
            ssl_certificate: payload.ssl_certificate,
            alpn: payload
                .alpn
                .map(|a| a.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            max_connections: payload.maxconn,
        }
    }
}

pub struct BindResource;

impl RemoteResource for BindResource {
    const KIND: ResourceKind = ResourceKind::Bind;
    const TYPE_NAME: &'static str = "haproxy_bind";
    type Model = BindModel;
    type Payload = BindPayload;

    fn parent(model: &BindModel) -> Option<ParentRef> {
        Some(ParentRef::frontend(model.frontend.clone()))
    }

    fn name(model: &BindModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &BindModel) -> BindPayload {
        model.into()
    }

    fn from_payload(payload: BindPayload, parent: Option<&ParentRef>) -> BindModel {
        BindModel::from_payload(parent.map(|p| p.name.as_str()).unwrap_or_default(), payload)
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("frontend", AttributeType::String).force_new(),
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::optional("address", AttributeType::String),
            Attribute::optional("port", AttributeType::Number),
            Attribute::optional("ssl", AttributeType::Bool),
            Attribute::optional("ssl_certificate", AttributeType::String),
            Attribute::optional("alpn", Attribute::list_of(AttributeType::String)),
            Attribute::optional("max_connections", AttributeType::Number),
        ])
    }
}
