//! resolvers, peers, global 섹션

use serde::{Deserialize, Serialize};

use super::{from_flag, to_flag, ParentRef, RemoteResource, ResourceKind};
use crate::provider::{Attribute, AttributeType, ResourceSchema};

// ---------------------------------------------------------------------------
// resolvers / nameserver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_payload_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_valid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_retry: Option<u64>,
    #[serde(rename = "parse-resolv-conf", default, skip_serializing_if = "Option::is_none")]
    pub parse_resolv_conf: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverModel {
    pub name: String,
    pub accepted_payload_size: Option<u32>,
    pub hold_valid_ms: Option<u64>,
    pub resolve_retries: Option<u32>,
    pub timeout_retry_ms: Option<u64>,
    #[serde(default)]
    pub parse_resolv_conf: bool,
}

impl From<&ResolverModel> for ResolverPayload {
    fn from(model: &ResolverModel) -> Self {
        Self {
            name: model.name.clone(),
            accepted_payload_size: model.accepted_payload_size,
            hold_valid: model.hold_valid_ms,
            resolve_retries: model.resolve_retries,
            timeout_retry: model.timeout_retry_ms,
            parse_resolv_conf: model.parse_resolv_conf.then_some(true),
        }
    }
}

impl From<ResolverPayload> for ResolverModel {
    fn from(payload: ResolverPayload) -> Self {
        Self {
            name: payload.name,
            accepted_payload_size: payload.accepted_payload_size,
            hold_valid_ms: payload.hold_valid,
            resolve_retries: payload.resolve_retries,
            timeout_retry_ms: payload.timeout_retry,
            parse_resolv_conf: payload.parse_resolv_conf.unwrap_or(false),
        }
    }
}

pub struct ResolverResource;

impl RemoteResource for ResolverResource {
    const KIND: ResourceKind = ResourceKind::Resolver;
    const TYPE_NAME: &'static str = "haproxy_resolver";
    type Model = ResolverModel;
    type Payload = ResolverPayload;

    fn parent(_: &ResolverModel) -> Option<ParentRef> {
        None
    }

    fn name(model: &ResolverModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &ResolverModel) -> ResolverPayload {
        model.into()
    }

    fn from_payload(payload: ResolverPayload, _: Option<&ParentRef>) -> ResolverModel {
        payload.into()
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::optional("accepted_payload_size", AttributeType::Number),
            Attribute::optional("hold_valid_ms", AttributeType::Number),
            Attribute::optional("resolve_retries", AttributeType::Number),
            Attribute::optional("timeout_retry_ms", AttributeType::Number),
            Attribute::optional("parse_resolv_conf", AttributeType::Bool),
        ])
    }
}

/// nameserver와 peer 항목이 함께 쓰는 주소 페이로드
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointPayload {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameserverModel {
    pub resolver: String,
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
}

pub struct NameserverResource;

impl RemoteResource for NameserverResource {
    const KIND: ResourceKind = ResourceKind::Nameserver;
    const TYPE_NAME: &'static str = "haproxy_nameserver";
    type Model = NameserverModel;
    type Payload = EndpointPayload;

    fn parent(model: &NameserverModel) -> Option<ParentRef> {
        Some(ParentRef::resolver(model.resolver.clone()))
    }

    fn name(model: &NameserverModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &NameserverModel) -> EndpointPayload {
        EndpointPayload {
            name: model.name.clone(),
            address: model.address.clone(),
            port: model.port,
        }
    }

    fn from_payload(payload: EndpointPayload, parent: Option<&ParentRef>) -> NameserverModel {
        NameserverModel {
            resolver: parent.map(|p| p.name.clone()).unwrap_or_default(),
            name: payload.name,
            address: payload.address,
            port: payload.port,
        }
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("resolver", AttributeType::String).force_new(),
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::required("address", AttributeType::String),
            Attribute::optional("port", AttributeType::Number),
        ])
    }
}

// ---------------------------------------------------------------------------
// peers / peer entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerSectionPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerSectionModel {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}

pub struct PeerSectionResource;

impl RemoteResource for PeerSectionResource {
    const KIND: ResourceKind = ResourceKind::PeerSection;
    const TYPE_NAME: &'static str = "haproxy_peers";
    type Model = PeerSectionModel;
    type Payload = PeerSectionPayload;

    fn parent(_: &PeerSectionModel) -> Option<ParentRef> {
        None
    }

    fn name(model: &PeerSectionModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &PeerSectionModel) -> PeerSectionPayload {
        PeerSectionPayload {
            name: model.name.clone(),
            disabled: model.disabled.then_some(true),
        }
    }

    fn from_payload(payload: PeerSectionPayload, _: Option<&ParentRef>) -> PeerSectionModel {
        PeerSectionModel {
            name: payload.name,
            disabled: payload.disabled.unwrap_or(false),
        }
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::optional("disabled", AttributeType::Bool),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerEntryModel {
    pub peers: String,
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
}

pub struct PeerEntryResource;

impl RemoteResource for PeerEntryResource {
    const KIND: ResourceKind = ResourceKind::PeerEntry;
    const TYPE_NAME: &'static str = "haproxy_peer_entry";
    type Model = PeerEntryModel;
    type Payload = EndpointPayload;

    fn parent(model: &PeerEntryModel) -> Option<ParentRef> {
        Some(ParentRef::peers(model.peers.clone()))
    }

    fn name(model: &PeerEntryModel) -> Option<String> {
        Some(model.name.clone())
    }

    fn to_payload(model: &PeerEntryModel) -> EndpointPayload {
        EndpointPayload {
            name: model.name.clone(),
            address: model.address.clone(),
            port: model.port,
        }
    }

    fn from_payload(payload: EndpointPayload, parent: Option<&ParentRef>) -> PeerEntryModel {
        PeerEntryModel {
            peers: parent.map(|p| p.name.clone()).unwrap_or_default(),
            name: payload.name,
            address: payload.address,
            port: payload.port,
        }
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::required("peers", AttributeType::String).force_new(),
            Attribute::required("name", AttributeType::String).force_new(),
            Attribute::required("address", AttributeType::String),
            Attribute::optional("port", AttributeType::Number),
        ])
    }
}

// ---------------------------------------------------------------------------
// global
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxconn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbthread: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_default_bind_ciphers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_default_bind_options: Option<String>,
}

/// 프로세스 전역 설정. 이름 없이 하나만 존재합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalModel {
    pub max_connections: Option<u64>,
    pub threads: Option<u32>,
    #[serde(default)]
    pub daemon: bool,
    pub pid_file: Option<String>,
    pub ssl_default_bind_ciphers: Option<String>,
    pub ssl_default_bind_options: Option<String>,
}

impl From<&GlobalModel> for GlobalPayload {
    fn from(model: &GlobalModel) -> Self {
        Self {
            maxconn: model.max_connections,
            nbthread: model.threads,
            daemon: to_flag(model.daemon),
            pidfile: model.pid_file.clone(),
            ssl_default_bind_ciphers: model.ssl_default_bind_ciphers.clone(),
            ssl_default_bind_options: model.ssl_default_bind_options.clone(),
        }
    }
}

impl From<GlobalPayload> for GlobalModel {
    fn from(payload: GlobalPayload) -> Self {
        Self {
            max_connections: payload.maxconn,
            threads: payload.nbthread,
            daemon: from_flag(payload.daemon.as_deref()),
            pid_file: payload.pidfile,
            ssl_default_bind_ciphers: payload.ssl_default_bind_ciphers,
            ssl_default_bind_options: payload.ssl_default_bind_options,
        }
    }
}

pub struct GlobalResource;

impl RemoteResource for GlobalResource {
    const KIND: ResourceKind = ResourceKind::Global;
    const TYPE_NAME: &'static str = "haproxy_global";
    type Model = GlobalModel;
    type Payload = GlobalPayload;

    fn parent(_: &GlobalModel) -> Option<ParentRef> {
        None
    }

    fn name(_: &GlobalModel) -> Option<String> {
        None
    }

    fn to_payload(model: &GlobalModel) -> GlobalPayload {
        model.into()
    }

    fn from_payload(payload: GlobalPayload, _: Option<&ParentRef>) -> GlobalModel {
        payload.into()
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME).with_attributes([
            Attribute::optional("max_connections", AttributeType::Number),
            Attribute::optional("threads", AttributeType::Number),
            Attribute::optional("daemon", AttributeType::Bool),
            Attribute::optional("pid_file", AttributeType::String),
            Attribute::optional("ssl_default_bind_ciphers", AttributeType::String),
            Attribute::optional("ssl_default_bind_options", AttributeType::String),
        ])
    }
}
