//! 위치로 식별되는 하위 항목: ACL, HTTP/TCP 규칙, 헬스 체크
//!
//! 이 항목들은 모델과 원격 페이로드가 같은 모양이라 한 타입으로 양쪽을 표현합니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ResourceKind;
use crate::provider::{Attribute, AttributeType};
use crate::reconcile::OrderedChild;

// JSON 배열로 직렬화해 빈 문자열과 값 없음, 구분자가 들어간 값을 서로 구별한다
fn join_key(parts: &[Option<&str>]) -> String {
    Value::Array(parts.iter().map(|p| p.map_or(Value::Null, Value::from)).collect()).to_string()
}

fn condition_attributes() -> [Attribute; 2] {
    [
        Attribute::optional("cond", AttributeType::String).describe("if 또는 unless"),
        Attribute::optional("cond_test", AttributeType::String),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acl {
    pub acl_name: String,
    pub criterion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl OrderedChild for Acl {
    const KIND: ResourceKind = ResourceKind::Acl;
    const TYPE_NAME: &'static str = "haproxy_acls";

    fn content_key(&self) -> String {
        join_key(&[Some(self.acl_name.as_str()), Some(self.criterion.as_str()), self.value.as_deref()])
    }

    fn item_schema() -> Vec<Attribute> {
        vec![
            Attribute::required("acl_name", AttributeType::String),
            Attribute::required("criterion", AttributeType::String),
            Attribute::optional("value", AttributeType::String),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequestRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redir_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redir_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny_status: Option<u16>,
}

impl OrderedChild for HttpRequestRule {
    const KIND: ResourceKind = ResourceKind::HttpRequestRule;
    const TYPE_NAME: &'static str = "haproxy_http_request_rules";

    // 헤더 값이나 상태 코드만 바뀐 규칙은 같은 규칙으로 보고 제자리에서 고친다
    fn content_key(&self) -> String {
        join_key(&[
            Some(self.rule_type.as_str()),
            self.cond.as_deref(),
            self.cond_test.as_deref(),
            self.hdr_name.as_deref(),
            self.redir_type.as_deref(),
        ])
    }

    fn item_schema() -> Vec<Attribute> {
        let mut attributes = vec![Attribute::required("type", AttributeType::String)];
        attributes.extend(condition_attributes());
        attributes.extend([
            Attribute::optional("hdr_name", AttributeType::String),
            Attribute::optional("hdr_format", AttributeType::String),
            Attribute::optional("redir_type", AttributeType::String),
            Attribute::optional("redir_value", AttributeType::String),
            Attribute::optional("deny_status", AttributeType::Number),
        ]);
        attributes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponseRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl OrderedChild for HttpResponseRule {
    const KIND: ResourceKind = ResourceKind::HttpResponseRule;
    const TYPE_NAME: &'static str = "haproxy_http_response_rules";

    fn content_key(&self) -> String {
        join_key(&[
            Some(self.rule_type.as_str()),
            self.cond.as_deref(),
            self.cond_test.as_deref(),
            self.hdr_name.as_deref(),
        ])
    }

    fn item_schema() -> Vec<Attribute> {
        let mut attributes = vec![Attribute::required("type", AttributeType::String)];
        attributes.extend(condition_attributes());
        attributes.extend([
            Attribute::optional("hdr_name", AttributeType::String),
            Attribute::optional("hdr_format", AttributeType::String),
            Attribute::optional("status", AttributeType::Number),
        ]);
        attributes
    }
}

/// tcp-request / tcp-response 규칙
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpRule {
    /// connection, content, inspect-delay ...
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond_test: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl TcpRule {
    fn key(&self) -> String {
        join_key(&[
            Some(self.rule_type.as_str()),
            self.action.as_deref(),
            self.cond.as_deref(),
            self.cond_test.as_deref(),
        ])
    }

    fn attributes() -> Vec<Attribute> {
        let mut attributes = vec![
            Attribute::required("type", AttributeType::String),
            Attribute::optional("action", AttributeType::String),
        ];
        attributes.extend(condition_attributes());
        attributes.push(Attribute::optional("timeout", AttributeType::Number));
        attributes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TcpRequestRule(pub TcpRule);

impl OrderedChild for TcpRequestRule {
    const KIND: ResourceKind = ResourceKind::TcpRequestRule;
    const TYPE_NAME: &'static str = "haproxy_tcp_request_rules";

    fn content_key(&self) -> String {
        self.0.key()
    }

    fn item_schema() -> Vec<Attribute> {
        TcpRule::attributes()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TcpResponseRule(pub TcpRule);

impl OrderedChild for TcpResponseRule {
    const KIND: ResourceKind = ResourceKind::TcpResponseRule;
    const TYPE_NAME: &'static str = "haproxy_tcp_response_rules";

    fn content_key(&self) -> String {
        self.0.key()
    }

    fn item_schema() -> Vec<Attribute> {
        TcpRule::attributes()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpCheck {
    /// connect, send, expect, comment ...
    pub action: String,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_comment: Option<String>,
}

impl OrderedChild for TcpCheck {
    const KIND: ResourceKind = ResourceKind::TcpCheck;
    const TYPE_NAME: &'static str = "haproxy_tcp_checks";

    fn content_key(&self) -> String {
        let port = self.port.map(|p| p.to_string());
        join_key(&[
            Some(self.action.as_str()),
            self.match_kind.as_deref(),
            self.pattern.as_deref(),
            self.data.as_deref(),
            port.as_deref(),
        ])
    }

    fn item_schema() -> Vec<Attribute> {
        vec![
            Attribute::required("action", AttributeType::String),
            Attribute::optional("match", AttributeType::String),
            Attribute::optional("pattern", AttributeType::String),
            Attribute::optional("data", AttributeType::String),
            Attribute::optional("port", AttributeType::Number),
            Attribute::optional("check_comment", AttributeType::String),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpCheck {
    /// send, expect, connect ...
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_comment: Option<String>,
}

impl OrderedChild for HttpCheck {
    const KIND: ResourceKind = ResourceKind::HttpCheck;
    const TYPE_NAME: &'static str = "haproxy_http_checks";

    fn content_key(&self) -> String {
        join_key(&[
            Some(self.check_type.as_str()),
            self.method.as_deref(),
            self.uri.as_deref(),
            self.match_kind.as_deref(),
            self.pattern.as_deref(),
        ])
    }

    fn item_schema() -> Vec<Attribute> {
        vec![
            Attribute::required("type", AttributeType::String),
            Attribute::optional("method", AttributeType::String),
            Attribute::optional("uri", AttributeType::String),
            Attribute::optional("version", AttributeType::String),
            Attribute::optional("match", AttributeType::String),
            Attribute::optional("pattern", AttributeType::String),
            Attribute::optional("check_comment", AttributeType::String),
        ]
    }
}
