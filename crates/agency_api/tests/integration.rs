use std::sync::{Arc, Mutex};
use std::time::Duration;

use agency_api::{
    Agency, AgencyApiError, ApiConfig, AuthClient, DocumentUpload, Identity, PipelineClient,
    RunAgencyRequest,
};
use reqwest::StatusCode;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Clone)]
struct ScriptedResponse {
    status: u16,
    body: String,
    delay_ms: u64,
}

fn response_json(status: u16, body: serde_json::Value) -> ScriptedResponse {
    ScriptedResponse {
        status,
        body: body.to_string(),
        delay_ms: 0,
    }
}

#[derive(Debug, Clone)]
struct CapturedRequest {
    head: String,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_owned())
        })
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct ScriptedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, requests).await;
                    });
                }
            }
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        500 => "Internal Server Error",
        _ => "Error",
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
) {
    let Ok(captured) = read_request(&mut socket).await else {
        return;
    };

    let index = {
        let mut requests = requests.lock().expect("requests lock");
        requests.push(captured);
        requests.len() - 1
    };
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| response_json(500, json!({"detail": "unexpected request"})));

    if response.delay_ms > 0 {
        sleep(Duration::from_millis(response.delay_ms)).await;
    }

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        status_reason(response.status),
        response.body.len(),
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    let _ = socket.write_all(response.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<CapturedRequest> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(position) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).into_owned();
    let mut body = raw[head_end..].to_vec();
    let captured = CapturedRequest {
        head,
        body: Vec::new(),
    };

    if let Some(length) = captured
        .header("content-length")
        .and_then(|value| value.parse::<usize>().ok())
    {
        while body.len() < length {
            let n = socket.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buffer[..n]);
        }
    } else if captured
        .header("transfer-encoding")
        .is_some_and(|value| value.eq_ignore_ascii_case("chunked"))
    {
        while !body.ends_with(b"0\r\n\r\n") {
            let n = socket.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buffer[..n]);
        }
    }

    Ok(CapturedRequest { body, ..captured })
}

#[tokio::test]
async fn login_then_users_me_round_trip() {
    let server = ScriptedServer::new(vec![
        response_json(200, json!({"access_token": "tok-9", "token_type": "bearer"})),
        response_json(
            200,
            json!({"id": 7, "email": "ada@example.com", "is_active": true, "is_superuser": false}),
        ),
    ])
    .await;

    let client = AuthClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let token = client
        .login_access_token("ada@example.com", "pw")
        .await
        .expect("login should succeed");
    assert_eq!(token.access_token, "tok-9");

    let identity = client
        .users_me(Some(&token.access_token))
        .await
        .expect("identity lookup should succeed");
    assert_eq!(
        identity,
        Identity {
            id: 7,
            email: "ada@example.com".to_owned(),
            is_active: true,
            is_superuser: false,
        }
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].request_line(), "POST /login/access-token HTTP/1.1");
    assert_eq!(requests[0].body_text(), "username=ada%40example.com&password=pw");
    assert_eq!(requests[0].header("authorization"), None);
    assert_eq!(requests[1].request_line(), "GET /users/me HTTP/1.1");
    assert_eq!(
        requests[1].header("authorization").as_deref(),
        Some("Bearer tok-9")
    );

    server.shutdown();
}

#[tokio::test]
async fn login_failure_surfaces_detail_message() {
    let server = ScriptedServer::new(vec![response_json(
        400,
        json!({"detail": "Incorrect email or password"}),
    )])
    .await;

    let client = AuthClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let error = client
        .login_access_token("ada@example.com", "wrong")
        .await
        .expect_err("login should fail");

    match error {
        AgencyApiError::Status(status, message) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Incorrect email or password");
        }
        other => panic!("unexpected error: {other}"),
    }

    server.shutdown();
}

#[tokio::test]
async fn run_agency_returns_raw_payload() {
    let payload = json!({
        "status": "success",
        "output": {"document": "NDA text"},
        "metrics": {"risk_score": 42}
    });
    let server = ScriptedServer::new(vec![response_json(200, payload.clone())]).await;

    let client = PipelineClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let response = client
        .run_agency(&RunAgencyRequest::new("Draft an NDA", Agency::Legal))
        .await
        .expect("run should succeed");
    assert_eq!(response, payload);

    let requests = server.requests();
    assert_eq!(requests[0].request_line(), "POST /run-agency HTTP/1.1");
    let sent: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("json request body");
    assert_eq!(sent, json!({"prompt": "Draft an NDA", "agency_type": "legal"}));

    server.shutdown();
}

#[tokio::test]
async fn run_agency_rejects_non_json_body() {
    let server = ScriptedServer::new(vec![ScriptedResponse {
        status: 200,
        body: "<html>gateway</html>".to_owned(),
        delay_ms: 0,
    }])
    .await;

    let client = PipelineClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let error = client
        .run_agency(&RunAgencyRequest::new("hi", Agency::Design))
        .await
        .expect_err("html body is not a payload");
    assert!(matches!(error, AgencyApiError::Serde(_)));

    server.shutdown();
}

#[tokio::test]
async fn ingest_sends_multipart_file_field() {
    let server = ScriptedServer::new(vec![response_json(200, json!({"status": "ok"}))]).await;

    let client = PipelineClient::new(ApiConfig::new(&server.base_url)).expect("client");
    client
        .ingest(DocumentUpload::new("contract.txt", b"clause one".to_vec()))
        .await
        .expect("ingest should succeed");

    let requests = server.requests();
    assert_eq!(requests[0].request_line(), "POST /ingest HTTP/1.1");
    assert!(requests[0]
        .header("content-type")
        .expect("content type")
        .starts_with("multipart/form-data; boundary="));
    let body = requests[0].body_text();
    assert!(body.contains("name=\"file\"; filename=\"contract.txt\""));
    assert!(body.contains("clause one"));

    server.shutdown();
}

#[tokio::test]
async fn ingest_failure_is_status_error() {
    let server = ScriptedServer::new(vec![response_json(500, json!({"detail": "disk full"}))]).await;

    let client = PipelineClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let error = client
        .ingest(DocumentUpload::new("a.txt", b"x".to_vec()))
        .await
        .expect_err("ingest should fail");
    assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(error.to_string(), "HTTP 500 Internal Server Error disk full");

    server.shutdown();
}

#[tokio::test]
async fn slow_backend_hits_request_timeout() {
    let server = ScriptedServer::new(vec![ScriptedResponse {
        status: 200,
        body: json!({"status": "ok"}).to_string(),
        delay_ms: 1_000,
    }])
    .await;

    let config = ApiConfig::new(&server.base_url).with_timeout(Duration::from_millis(100));
    let client = PipelineClient::new(config).expect("client");
    let error = client.health().await.expect_err("health should time out");
    assert!(matches!(error, AgencyApiError::Timeout));

    server.shutdown();
}

#[tokio::test]
async fn health_reports_ok_status() {
    let server = ScriptedServer::new(vec![response_json(200, json!({"status": "ok"}))]).await;

    let client = PipelineClient::new(ApiConfig::new(&server.base_url)).expect("client");
    let health = client.health().await.expect("health should succeed");
    assert!(health.is_ok());
    assert_eq!(server.requests()[0].request_line(), "GET /health HTTP/1.1");

    server.shutdown();
}
