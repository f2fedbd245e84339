use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use haproxy_dataplane_provider::dataplane::{ApiError, ConflictKind, DataPlaneClient, HttpDataPlaneClient, Transaction};
use haproxy_dataplane_provider::provider::mutation::ResourceMutation;
use haproxy_dataplane_provider::resource::{Locator, ParentRef, ResourceKind};
use haproxy_dataplane_provider::settings::DataPlaneSettings;
use haproxy_dataplane_provider::transaction::{RetryPolicy, TransactionCoordinator};
use serde_json::json;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    uri: String,
    authorization: Option<String>,
    body: String,
}

type Responder = fn(&Method, &str) -> (u16, &'static str);

// 요청을 기록하고 responder가 정한 응답을 돌려주는 Data Plane API 흉내
async fn spawn_api(responder: Responder) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));

    let log = recorded.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let log = log.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let log = log.clone();
                    async move {
                        let method = req.method().clone();
                        let path = req.uri().path().to_string();
                        let uri = req.uri().to_string();
                        let authorization = req
                            .headers()
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let body = req.into_body().collect().await.unwrap().to_bytes();

                        log.lock().unwrap().push(Recorded {
                            method: method.clone(),
                            uri,
                            authorization,
                            body: String::from_utf8_lossy(&body).to_string(),
                        });

                        let (status, body) = responder(&method, &path);
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(StatusCode::from_u16(status).unwrap())
                                .header(header::CONTENT_TYPE, "application/json")
                                .body(Full::new(Bytes::from(body)))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await;
            });
        }
    });

    (format!("http://{}", addr), recorded)
}

fn client(url: &str) -> HttpDataPlaneClient {
    HttpDataPlaneClient::new(&DataPlaneSettings {
        url: url.to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        timeout: 5,
    })
    .unwrap()
}

fn happy_path(method: &Method, path: &str) -> (u16, &'static str) {
    match (method.as_str(), path) {
        ("GET", "/v3/services/haproxy/configuration/version") => (200, "7"),
        ("POST", "/v3/services/haproxy/transactions") => (201, r#"{"id":"abc","_version":7,"status":"in_progress"}"#),
        ("PUT", "/v3/services/haproxy/transactions/abc") => (202, ""),
        ("DELETE", "/v3/services/haproxy/transactions/abc") => (204, ""),
        ("GET", "/v3/services/haproxy/configuration/backends/api/servers") => (200, "null"),
        ("GET", "/v3/services/haproxy/configuration/backends/api") => (200, r#"{"name":"api","mode":"http"}"#),
        ("GET", _) => (404, r#"{"code":404,"message":"missing does not exist"}"#),
        _ => (202, ""),
    }
}

#[tokio::test]
async fn test_transaction_request_sequence() {
    let (url, recorded) = spawn_api(happy_path).await;
    let coordinator = TransactionCoordinator::new(Arc::new(client(&url)), RetryPolicy::new(3, Duration::from_millis(10)));

    let work = ResourceMutation::create(
        Locator::named(ResourceKind::Backend, None, "api"),
        json!({ "name": "api" }),
    );
    coordinator.run_in_transaction(&CancellationToken::new(), &work).await.unwrap();

    let recorded = recorded.lock().unwrap().clone();
    let requests: Vec<(String, String)> = recorded
        .iter()
        .map(|r| (r.method.to_string(), r.uri.clone()))
        .collect();
    assert_eq!(
        requests,
        vec![
            ("GET".to_string(), "/v3/services/haproxy/configuration/version".to_string()),
            ("POST".to_string(), "/v3/services/haproxy/transactions?version=7".to_string()),
            (
                "POST".to_string(),
                "/v3/services/haproxy/configuration/backends?transaction_id=abc".to_string()
            ),
            ("PUT".to_string(), "/v3/services/haproxy/transactions/abc".to_string()),
        ]
    );
    assert_eq!(serde_json::from_str::<serde_json::Value>(&recorded[2].body).unwrap(), json!({ "name": "api" }));
    for request in &recorded {
        assert_eq!(request.authorization.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
    }
}

#[tokio::test]
async fn test_write_paths_per_identity() {
    let (url, recorded) = spawn_api(happy_path).await;
    let client = client(&url);
    let transaction = Transaction::new("abc", 7);
    let frontend = ParentRef::frontend("www");

    client
        .create(&Locator::singleton(ResourceKind::Global), &transaction, &json!({ "maxconn": 100 }))
        .await
        .unwrap();
    client
        .create(&Locator::indexed(ResourceKind::Acl, frontend.clone(), 2), &transaction, &json!({}))
        .await
        .unwrap();
    client
        .update(&Locator::indexed(ResourceKind::Acl, frontend.clone(), 0), &transaction, &json!({}))
        .await
        .unwrap();
    client
        .delete(&Locator::named(ResourceKind::Bind, Some(frontend.clone()), "public"), &transaction)
        .await
        .unwrap();
    client
        .replace_all(
            ResourceKind::TcpCheck,
            Some(&ParentRef::backend("api")),
            &transaction,
            &[json!({ "action": "connect" })],
        )
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap().clone();
    let requests: Vec<String> = recorded.iter().map(|r| format!("{} {}", r.method, r.uri)).collect();
    assert_eq!(
        requests,
        vec![
            "PUT /v3/services/haproxy/configuration/global?transaction_id=abc",
            "POST /v3/services/haproxy/configuration/frontends/www/acls/2?transaction_id=abc",
            "PUT /v3/services/haproxy/configuration/frontends/www/acls/0?transaction_id=abc",
            "DELETE /v3/services/haproxy/configuration/frontends/www/binds/public?transaction_id=abc",
            "PUT /v3/services/haproxy/configuration/backends/api/tcp_checks?transaction_id=abc",
        ]
    );
    assert_eq!(recorded[4].body, r#"[{"action":"connect"}]"#);
}

#[tokio::test]
async fn test_reads_outside_transaction() {
    let (url, recorded) = spawn_api(happy_path).await;
    let client = client(&url);
    let backend = ParentRef::backend("api");

    let value = client
        .read(&Locator::named(ResourceKind::Backend, None, "api"), None)
        .await
        .unwrap();
    assert_eq!(value["mode"], json!("http"));

    // null 목록은 빈 목록
    let servers = client.list(ResourceKind::Server, Some(&backend), None).await.unwrap();
    assert!(servers.is_empty());

    let missing = client
        .read(&Locator::named(ResourceKind::Backend, None, "missing"), None)
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
    assert!(missing.to_string().contains("missing does not exist"));

    assert!(recorded.lock().unwrap().iter().all(|r| !r.uri.contains("transaction_id")));
}

fn failing(method: &Method, path: &str) -> (u16, &'static str) {
    match (method.as_str(), path) {
        (_, "/v3/services/haproxy/configuration/backends") => (406, r#"{"code":406,"message":"transaction abc is outdated"}"#),
        (_, "/v3/services/haproxy/configuration/frontends") => (409, r#"{"code":409,"message":"object already exists"}"#),
        (_, "/v3/services/haproxy/transactions/abc") => (500, "upstream exploded"),
        _ => (400, r#"{"code":400,"message":"version or transaction not specified"}"#),
    }
}

#[tokio::test]
async fn test_error_bodies_are_classified() {
    let (url, _) = spawn_api(failing).await;
    let client = client(&url);
    let transaction = Transaction::new("abc", 7);

    let outdated = client
        .create(&Locator::named(ResourceKind::Backend, None, "api"), &transaction, &json!({}))
        .await
        .unwrap_err();
    assert_eq!(outdated.status_code(), Some(406));
    assert_eq!(outdated.conflict(), Some(ConflictKind::TransactionOutdated));

    // 409라도 메시지가 충돌이 아니면 재시도 대상이 아니다
    let exists = client
        .create(&Locator::named(ResourceKind::Frontend, None, "www"), &transaction, &json!({}))
        .await
        .unwrap_err();
    assert_eq!(exists.status_code(), Some(409));
    assert_eq!(exists.conflict(), None);
    assert!(exists.to_string().contains("object already exists"));

    // JSON이 아닌 본문은 그대로 메시지가 된다
    let raw = client.commit_transaction("abc").await.unwrap_err();
    assert!(raw.to_string().contains("upstream exploded"));

    let unspecified = client.begin_transaction(7).await.unwrap_err();
    assert_eq!(unspecified.conflict(), Some(ConflictKind::VersionNotSpecified));
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    // 포트를 잡았다 놓아 아무도 듣지 않는 주소를 만든다
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{}", addr));
    let error = client.configuration_version().await.unwrap_err();
    assert!(matches!(error, ApiError::Transport { .. }), "{:?}", error);
}
