use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::reconcile::ReconcileStrategy;

/// 하위 리소스가 연결될 수 있는 부모 섹션 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Frontend,
    Backend,
    Resolver,
    Peers,
}

impl ParentKind {
    /// 경로에 쓰이는 컬렉션 이름
    pub fn segment(&self) -> &'static str {
        match self {
            ParentKind::Frontend => "frontends",
            ParentKind::Backend => "backends",
            ParentKind::Resolver => "resolvers",
            ParentKind::Peers => "peers",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Frontend => "frontend",
            ParentKind::Backend => "backend",
            ParentKind::Resolver => "resolver",
            ParentKind::Peers => "peers",
        }
    }

    /// 부모 자신을 표현하는 리소스 종류
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            ParentKind::Frontend => ResourceKind::Frontend,
            ParentKind::Backend => ResourceKind::Backend,
            ParentKind::Resolver => ResourceKind::Resolver,
            ParentKind::Peers => ResourceKind::PeerSection,
        }
    }
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(ParentKind::Frontend),
            "backend" => Ok(ParentKind::Backend),
            "resolver" => Ok(ParentKind::Resolver),
            "peers" => Ok(ParentKind::Peers),
            other => Err(format!("알 수 없는 부모 종류: {}", other)),
        }
    }
}

/// 부모 섹션 참조 (종류 + 이름)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub name: String,
}

impl ParentRef {
    pub fn new(kind: ParentKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }

    pub fn frontend(name: impl Into<String>) -> Self {
        Self::new(ParentKind::Frontend, name)
    }

    pub fn backend(name: impl Into<String>) -> Self {
        Self::new(ParentKind::Backend, name)
    }

    pub fn resolver(name: impl Into<String>) -> Self {
        Self::new(ParentKind::Resolver, name)
    }

    pub fn peers(name: impl Into<String>) -> Self {
        Self::new(ParentKind::Peers, name)
    }

    /// 부모 자신을 가리키는 로케이터
    pub fn locator(&self) -> Locator {
        Locator::named(self.kind.resource_kind(), None, self.name.clone())
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// 리소스가 요구하는 부모의 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentShape {
    /// 최상위 섹션
    Root,
    /// 정해진 한 종류의 부모
    Exactly(ParentKind),
    /// frontend 또는 backend
    FrontendOrBackend,
}

impl ParentShape {
    pub fn accepts(&self, parent: Option<&ParentRef>) -> bool {
        match (self, parent) {
            (ParentShape::Root, None) => true,
            (ParentShape::Exactly(kind), Some(parent)) => parent.kind == *kind,
            (ParentShape::FrontendOrBackend, Some(parent)) => {
                matches!(parent.kind, ParentKind::Frontend | ParentKind::Backend)
            }
            _ => false,
        }
    }
}

/// 원격 API에서 리소스를 식별하는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// 섹션 전체에 하나만 존재 (global)
    Singleton,
    /// 이름으로 식별
    Named,
    /// 부모 안에서의 0 기반 위치로 식별
    Indexed,
}

/// Data Plane API가 다루는 설정 엔티티 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Global,
    Frontend,
    Backend,
    Server,
    Bind,
    Acl,
    HttpRequestRule,
    HttpResponseRule,
    TcpRequestRule,
    TcpResponseRule,
    TcpCheck,
    HttpCheck,
    Resolver,
    Nameserver,
    PeerSection,
    PeerEntry,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 16] = [
        ResourceKind::Global,
        ResourceKind::Frontend,
        ResourceKind::Backend,
        ResourceKind::Server,
        ResourceKind::Bind,
        ResourceKind::Acl,
        ResourceKind::HttpRequestRule,
        ResourceKind::HttpResponseRule,
        ResourceKind::TcpRequestRule,
        ResourceKind::TcpResponseRule,
        ResourceKind::TcpCheck,
        ResourceKind::HttpCheck,
        ResourceKind::Resolver,
        ResourceKind::Nameserver,
        ResourceKind::PeerSection,
        ResourceKind::PeerEntry,
    ];

    /// 경로 템플릿의 컬렉션 세그먼트
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::Global => "global",
            ResourceKind::Frontend => "frontends",
            ResourceKind::Backend => "backends",
            ResourceKind::Server => "servers",
            ResourceKind::Bind => "binds",
            ResourceKind::Acl => "acls",
            ResourceKind::HttpRequestRule => "http_request_rules",
            ResourceKind::HttpResponseRule => "http_response_rules",
            ResourceKind::TcpRequestRule => "tcp_request_rules",
            ResourceKind::TcpResponseRule => "tcp_response_rules",
            ResourceKind::TcpCheck => "tcp_checks",
            ResourceKind::HttpCheck => "http_checks",
            ResourceKind::Resolver => "resolvers",
            ResourceKind::Nameserver => "nameservers",
            ResourceKind::PeerSection => "peers",
            ResourceKind::PeerEntry => "peer_entries",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Global => "global",
            ResourceKind::Frontend => "frontend",
            ResourceKind::Backend => "backend",
            ResourceKind::Server => "server",
            ResourceKind::Bind => "bind",
            ResourceKind::Acl => "acl",
            ResourceKind::HttpRequestRule => "http_request_rule",
            ResourceKind::HttpResponseRule => "http_response_rule",
            ResourceKind::TcpRequestRule => "tcp_request_rule",
            ResourceKind::TcpResponseRule => "tcp_response_rule",
            ResourceKind::TcpCheck => "tcp_check",
            ResourceKind::HttpCheck => "http_check",
            ResourceKind::Resolver => "resolver",
            ResourceKind::Nameserver => "nameserver",
            ResourceKind::PeerSection => "peer_section",
            ResourceKind::PeerEntry => "peer_entry",
        }
    }

    pub fn parent_shape(&self) -> ParentShape {
        match self {
            ResourceKind::Global
            | ResourceKind::Frontend
            | ResourceKind::Backend
            | ResourceKind::Resolver
            | ResourceKind::PeerSection => ParentShape::Root,
            ResourceKind::Server
            | ResourceKind::TcpResponseRule
            | ResourceKind::TcpCheck
            | ResourceKind::HttpCheck => ParentShape::Exactly(ParentKind::Backend),
            ResourceKind::Bind => ParentShape::Exactly(ParentKind::Frontend),
            ResourceKind::Nameserver => ParentShape::Exactly(ParentKind::Resolver),
            ResourceKind::PeerEntry => ParentShape::Exactly(ParentKind::Peers),
            ResourceKind::Acl
            | ResourceKind::HttpRequestRule
            | ResourceKind::HttpResponseRule
            | ResourceKind::TcpRequestRule => ParentShape::FrontendOrBackend,
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            ResourceKind::Global => Identity::Singleton,
            ResourceKind::Acl
            | ResourceKind::HttpRequestRule
            | ResourceKind::HttpResponseRule
            | ResourceKind::TcpRequestRule
            | ResourceKind::TcpResponseRule
            | ResourceKind::TcpCheck
            | ResourceKind::HttpCheck => Identity::Indexed,
            _ => Identity::Named,
        }
    }

    /// 순서가 있는 하위 컬렉션의 갱신 전략. 위치로 식별되지 않는 종류는 `None`.
    ///
    /// 체크 목록은 원격 API의 일괄 교체로 순서를 그대로 맞추고,
    /// ACL과 규칙 목록은 변경분만 반영합니다.
    pub fn reconcile_strategy(&self) -> Option<ReconcileStrategy> {
        match self {
            ResourceKind::TcpCheck | ResourceKind::HttpCheck => Some(ReconcileStrategy::ReplaceAll),
            ResourceKind::Acl
            | ResourceKind::HttpRequestRule
            | ResourceKind::HttpResponseRule
            | ResourceKind::TcpRequestRule
            | ResourceKind::TcpResponseRule => Some(ReconcileStrategy::Diff),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이름 또는 위치 기반 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Name(String),
    Index(usize),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Name(name) => f.write_str(name),
            ResourceId::Index(index) => write!(f, "{}", index),
        }
    }
}

/// 원격 API 위의 한 객체 위치
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub kind: ResourceKind,
    pub parent: Option<ParentRef>,
    pub id: Option<ResourceId>,
}

impl Locator {
    pub fn new(kind: ResourceKind, parent: Option<ParentRef>, id: Option<ResourceId>) -> Self {
        Self { kind, parent, id }
    }

    pub fn singleton(kind: ResourceKind) -> Self {
        Self::new(kind, None, None)
    }

    pub fn named(kind: ResourceKind, parent: Option<ParentRef>, name: impl Into<String>) -> Self {
        Self::new(kind, parent, Some(ResourceId::Name(name.into())))
    }

    pub fn indexed(kind: ResourceKind, parent: ParentRef, index: usize) -> Self {
        Self::new(kind, Some(parent), Some(ResourceId::Index(index)))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{}/", parent)?;
        }
        f.write_str(self.kind.as_str())?;
        if let Some(id) = &self.id {
            write!(f, "[{}]", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_shape_acceptance() {
        let backend = ParentRef::backend("web");
        let frontend = ParentRef::frontend("http-in");

        assert!(ResourceKind::Server.parent_shape().accepts(Some(&backend)));
        assert!(!ResourceKind::Server.parent_shape().accepts(Some(&frontend)));
        assert!(!ResourceKind::Server.parent_shape().accepts(None));
        assert!(ResourceKind::Acl.parent_shape().accepts(Some(&frontend)));
        assert!(ResourceKind::Acl.parent_shape().accepts(Some(&backend)));
        assert!(!ResourceKind::Acl.parent_shape().accepts(Some(&ParentRef::resolver("dns"))));
        assert!(ResourceKind::Backend.parent_shape().accepts(None));
        assert!(!ResourceKind::Backend.parent_shape().accepts(Some(&backend)));
    }

    #[test]
    fn test_only_indexed_kinds_have_strategy() {
        for kind in ResourceKind::ALL {
            assert_eq!(
                kind.reconcile_strategy().is_some(),
                kind.identity() == Identity::Indexed,
                "{}",
                kind
            );
        }
    }

    #[test]
    fn test_locator_display() {
        let locator = Locator::indexed(ResourceKind::TcpCheck, ParentRef::backend("db"), 2);
        assert_eq!(locator.to_string(), "backend/db/tcp_check[2]");
        assert_eq!(Locator::singleton(ResourceKind::Global).to_string(), "global");
    }

    #[test]
    fn test_parent_kind_from_str() {
        assert_eq!("backend".parse::<ParentKind>(), Ok(ParentKind::Backend));
        assert!("listen".parse::<ParentKind>().is_err());
    }
}
