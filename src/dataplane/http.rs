use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Uri};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::instrument;
use url::Url;

use super::{paths, ApiError, DataPlaneClient, Transaction};
use crate::logging::{log_api_call, ApiCallLog};
use crate::resource::{Identity, Locator, ParentRef, ResourceId, ResourceKind};
use crate::settings::DataPlaneSettings;

/// 원격 API의 오류 응답 본문
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// hyper 기반 Data Plane API 클라이언트
#[derive(Clone)]
pub struct HttpDataPlaneClient {
    client: legacy::Client<HttpConnector, Full<Bytes>>,
    base: String,
    authorization: String,
    timeout: Duration,
}

impl HttpDataPlaneClient {
    pub fn new(settings: &DataPlaneSettings) -> Result<Self, ApiError> {
        let url = Url::parse(&settings.url).map_err(|e| ApiError::InvalidUrl {
            url: settings.url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" {
            return Err(ApiError::InvalidUrl {
                url: settings.url.clone(),
                reason: format!("지원하지 않는 스킴: {}", url.scheme()),
            });
        }

        let credentials = format!("{}:{}", settings.username, settings.password);
        let connector = HttpConnector::new();
        let client = legacy::Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(connector);

        Ok(Self {
            client,
            base: url.as_str().trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", BASE64.encode(credentials)),
            timeout: Duration::from_secs(settings.timeout),
        })
    }

    fn uri(&self, path: &str, query: &[(&str, String)]) -> Result<Uri, ApiError> {
        let mut target = format!("{}{}", self.base, path);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            target.push('?');
            target.push_str(&encoded);
        }

        target.parse().map_err(|e: hyper::http::uri::InvalidUri| ApiError::InvalidUrl {
            url: target.clone(),
            reason: e.to_string(),
        })
    }

    /// 요청을 보내고 2xx 응답 본문을 JSON으로 돌려줍니다. 빈 본문은 `None`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        transaction_id: Option<&str>,
    ) -> Result<Option<Value>, ApiError> {
        let started = Instant::now();
        let mut log = ApiCallLog::new(method.as_str(), path, transaction_id);
        let result = self.exchange(&method, path, query, body, &mut log).await;

        if let Err(e) = &result {
            log.with_error(e);
        }
        log.duration_ms = started.elapsed().as_millis() as u64;
        log_api_call(&log);

        result
    }

    async fn exchange(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
        log: &mut ApiCallLog,
    ) -> Result<Option<Value>, ApiError> {
        let uri = self.uri(path, query)?;
        let transport_error = |message: String| ApiError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            message,
        };

        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(header::AUTHORIZATION, &self.authorization)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| transport_error(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ApiError::Timeout {
                method: method.to_string(),
                path: path.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|e| transport_error(e.to_string()))?;

        let status = response.status();
        log.with_status(status.as_u16());

        let bytes = response
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| transport_error(e.to_string()))?;

        if !status.is_success() {
            let raw = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(raw);
            return Err(ApiError::status(method.as_str(), path, status.as_u16(), message));
        }

        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ApiError::Decode {
                context: format!("{} {}", method, path),
                source,
            })
    }

    fn encode(payload: &impl serde::Serialize) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(payload).map_err(|source| ApiError::Encode { source })
    }

    fn transaction_query(transaction: Option<&Transaction>) -> Vec<(&'static str, String)> {
        transaction
            .map(|t| vec![("transaction_id", t.id.clone())])
            .unwrap_or_default()
    }

    fn expect_body(value: Option<Value>, context: &str) -> Result<Value, ApiError> {
        value.ok_or_else(|| ApiError::Decode {
            context: context.to_string(),
            source: serde::de::Error::custom("응답 본문이 비어 있습니다"),
        })
    }
}

#[async_trait]
impl DataPlaneClient for HttpDataPlaneClient {
    async fn configuration_version(&self) -> Result<u64, ApiError> {
        let path = paths::configuration_version();
        let value = Self::expect_body(self.send(Method::GET, &path, &[], None, None).await?, &path)?;

        serde_json::from_value(value).map_err(|source| ApiError::Decode { context: path, source })
    }

    #[instrument(skip(self), level = "debug", err)]
    async fn begin_transaction(&self, version: u64) -> Result<Transaction, ApiError> {
        let path = paths::transactions();
        let query = [("version", version.to_string())];
        let value = Self::expect_body(self.send(Method::POST, &path, &query, None, None).await?, &path)?;

        serde_json::from_value(value).map_err(|source| ApiError::Decode { context: path, source })
    }

    #[instrument(skip(self), level = "debug", err)]
    async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ApiError> {
        let path = paths::transaction(transaction_id);
        self.send(Method::PUT, &path, &[], None, Some(transaction_id)).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug", err)]
    async fn rollback_transaction(&self, transaction_id: &str) -> Result<(), ApiError> {
        let path = paths::transaction(transaction_id);
        self.send(Method::DELETE, &path, &[], None, Some(transaction_id)).await?;
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: Option<&Transaction>,
    ) -> Result<Vec<Value>, ApiError> {
        let path = paths::collection(kind, parent)?;
        let query = Self::transaction_query(transaction);
        let value = self
            .send(Method::GET, &path, &query, None, transaction.map(|t| t.id.as_str()))
            .await?;

        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|source| ApiError::Decode { context: path, source }),
        }
    }

    async fn read(&self, locator: &Locator, transaction: Option<&Transaction>) -> Result<Value, ApiError> {
        let path = paths::item(locator)?;
        let query = Self::transaction_query(transaction);
        let value = self
            .send(Method::GET, &path, &query, None, transaction.map(|t| t.id.as_str()))
            .await?;

        Self::expect_body(value, &path)
    }

    async fn create(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError> {
        let (method, path) = match (locator.kind.identity(), &locator.id) {
            (Identity::Singleton, _) => (Method::PUT, paths::item(locator)?),
            (Identity::Indexed, Some(ResourceId::Index(_))) => (Method::POST, paths::item(locator)?),
            _ => (Method::POST, paths::collection(locator.kind, locator.parent.as_ref())?),
        };
        let query = Self::transaction_query(Some(transaction));
        self.send(method, &path, &query, Some(Self::encode(payload)?), Some(&transaction.id))
            .await?;
        Ok(())
    }

    async fn update(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError> {
        let path = paths::item(locator)?;
        let query = Self::transaction_query(Some(transaction));
        self.send(Method::PUT, &path, &query, Some(Self::encode(payload)?), Some(&transaction.id))
            .await?;
        Ok(())
    }

    async fn delete(&self, locator: &Locator, transaction: &Transaction) -> Result<(), ApiError> {
        let path = paths::item(locator)?;
        let query = Self::transaction_query(Some(transaction));
        self.send(Method::DELETE, &path, &query, None, Some(&transaction.id))
            .await?;
        Ok(())
    }

    async fn replace_all(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: &Transaction,
        payloads: &[Value],
    ) -> Result<(), ApiError> {
        let path = paths::collection(kind, parent)?;
        let query = Self::transaction_query(Some(transaction));
        self.send(Method::PUT, &path, &query, Some(Self::encode(&payloads)?), Some(&transaction.id))
            .await?;
        Ok(())
    }
}
