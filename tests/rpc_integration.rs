//! Integration tests for the RPC engine against a mock Transmission daemon.

mod support;
use support::socket_guard::{should_skip_socket_bound_test, start_mock_server_or_skip};

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use trctl_core::rpc::SESSION_ID_HEADER;
use trctl_core::{ErrorKind, Ids, RpcError, TagSource, TransmissionClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const RPC_PATH: &str = "/transmission/rpc";
const TOKEN: &str = "abc123";

fn client_for(mock_server: &MockServer) -> TransmissionClient {
    TransmissionClient::builder()
        .url(format!("{}{RPC_PATH}", mock_server.uri()))
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client should build")
}

/// Answers success with the request's own tag.
struct EchoTag {
    arguments: Value,
}

impl Respond for EchoTag {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "arguments": self.arguments,
            "tag": body["tag"],
        }))
    }
}

/// Mounts a daemon that demands `TOKEN` and echoes tags once it is presented.
async fn mount_daemon(mock_server: &MockServer, arguments: Value) {
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(header(SESSION_ID_HEADER, TOKEN))
        .respond_with(EchoTag { arguments })
        .with_priority(1)
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, TOKEN))
        .mount(mock_server)
        .await;
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_handshake_refreshes_token_and_resends_same_body() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_daemon(&mock_server, json!({"torrents": []})).await;
    let client = client_for(&mock_server);

    let result = client
        .torrent_get(&["id", "name"], None, None)
        .await
        .expect("call should succeed after handshake");

    assert_eq!(result.get("torrents"), Some(&json!([])));
    assert_eq!(client.session_id(), TOKEN);

    let requests = mock_server.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 2);
    assert_ne!(header_value(&requests[0], SESSION_ID_HEADER), Some(TOKEN));
    assert_eq!(header_value(&requests[1], SESSION_ID_HEADER), Some(TOKEN));
    assert_eq!(requests[0].body, requests[1].body, "retry must resend identical body");

    let sent: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        sent,
        json!({"method": "torrent-get", "arguments": {"fields": ["id", "name"]}, "tag": 2})
    );
}

#[tokio::test]
async fn test_token_is_reused_across_calls() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_daemon(&mock_server, json!({})).await;
    let client = client_for(&mock_server);

    client.session_stats().await.unwrap();
    client.port_test().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "only the first call should need a handshake");
}

#[tokio::test]
async fn test_second_conflict_is_auth_failure() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, "rotating"))
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server);

    let err = client.session_stats().await.unwrap_err();

    assert!(matches!(err, RpcError::AuthFailed { attempts: 2, .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_conflict_without_token_is_auth_failure() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server);

    let err = client.session_stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

struct FixedTag(u64);

impl TagSource for FixedTag {
    fn next_tag(&self) -> u64 {
        self.0
    }
}

#[tokio::test]
async fn test_free_space_with_injected_tag_source() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "arguments": {"path": "/data", "size-bytes": 1024},
            "tag": 5,
        })))
        .mount(&mock_server)
        .await;
    let client = TransmissionClient::builder()
        .url(format!("{}{RPC_PATH}", mock_server.uri()))
        .tag_source(Arc::new(FixedTag(5)))
        .build()
        .unwrap();

    let result = client.free_space("/data").await.unwrap();

    assert_eq!(result.get("size-bytes"), Some(&json!(1024)));
    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent,
        json!({"method": "free-space", "arguments": {"path": "/data"}, "tag": 5})
    );
}

#[tokio::test]
async fn test_tag_mismatch_is_protocol_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "arguments": {},
            "tag": 999,
        })))
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server);

    let err = client.session_stats().await.unwrap_err();
    assert!(
        matches!(err, RpcError::TagMismatch { got: Some(999), expected: 2 }),
        "got {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_failed_result_is_request_failed() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "no such torrent",
            "tag": 2,
        })))
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server);

    let err = client
        .torrent_rename_path(Some(Ids::from(9)), "a", "b")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no such torrent"));
    assert!(matches!(err, RpcError::RequestFailed { .. }));
}

#[tokio::test]
async fn test_body_without_result_is_malformed() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&mock_server)
        .await;
    let client = client_for(&mock_server);

    let err = client.session_stats().await.unwrap_err();
    assert!(matches!(err, RpcError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_http_status_mapping() {
    let cases: [(u16, fn(&RpcError) -> bool); 3] = [
        (401, |e| matches!(e, RpcError::Unauthorized { .. })),
        (421, |e| matches!(e, RpcError::Misdirected { .. })),
        (500, |e| matches!(e, RpcError::HttpStatus { status: 500, .. })),
    ];
    for (status, expected) in cases {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
        let client = client_for(&mock_server);

        let err = client.session_stats().await.unwrap_err();
        assert!(expected(&err), "status {status} mapped to {err:?}");
    }
}

#[tokio::test]
async fn test_credentials_and_host_are_sent() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .and(header("host", "nas.local"))
        .respond_with(EchoTag { arguments: json!({}) })
        .mount(&mock_server)
        .await;
    let client = TransmissionClient::builder()
        .url(format!("{}{RPC_PATH}", mock_server.uri()))
        .username("admin")
        .password("secret")
        .host("nas.local")
        .build()
        .unwrap();

    client.session_stats().await.expect("auth and host headers should match");
    assert!(!client.url().contains("secret"));
}

#[tokio::test]
async fn test_slow_daemon_times_out() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;
    let client = TransmissionClient::builder()
        .url(format!("{}{RPC_PATH}", mock_server.uri()))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.session_stats().await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Connect);
    assert!(
        err.to_string().to_lowercase().contains("timed out"),
        "timeout cause missing from: {err}"
    );
}

#[tokio::test]
async fn test_refused_connection_is_connect_error() {
    if should_skip_socket_bound_test() {
        return;
    }
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = TransmissionClient::builder()
        .url(format!("http://127.0.0.1:{port}{RPC_PATH}"))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.session_stats().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connect, "got {err:?}");
    let message = err.to_string();
    assert!(message.contains(&port.to_string()));
    assert!(
        message.to_lowercase().contains("refused"),
        "connection cause missing from: {message}"
    );
}

#[tokio::test]
async fn test_concurrent_calls_get_distinct_tags() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_daemon(&mock_server, json!({})).await;
    let client = Arc::new(client_for(&mock_server));

    let calls = (0..16).map(|_| {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.session_stats().await })
    });
    for joined in futures_util::future::join_all(calls).await {
        joined.expect("task panicked").expect("call should succeed");
    }

    assert_eq!(client.session_id(), TOKEN);
    let requests = mock_server.received_requests().await.unwrap();
    let mut tags: Vec<u64> = requests
        .iter()
        .filter(|r| header_value(r, SESSION_ID_HEADER) == Some(TOKEN))
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["tag"].as_u64().unwrap()
        })
        .collect();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), 16, "every call must carry its own tag");
}
