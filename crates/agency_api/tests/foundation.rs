use std::time::Duration;

use agency_api::{
    Agency, AgencyApiError, ApiConfig, AuthClient, DocumentUpload, PipelineClient,
    RunAgencyRequest,
};

#[test]
fn smoke_clients_construct_from_default_config() {
    let auth = AuthClient::new(ApiConfig::auth_default()).expect("auth client");
    let pipeline = PipelineClient::new(ApiConfig::pipeline_default()).expect("pipeline client");

    assert_eq!(auth.config().base_url, "http://localhost:8001/api/v1");
    assert_eq!(pipeline.config().base_url, "http://localhost:8002");
    assert_eq!(auth.config().timeout, Some(Duration::from_secs(120)));
}

#[test]
fn client_rejects_invalid_base_url() {
    let error = AuthClient::new(ApiConfig::new("localhost:8001"))
        .expect_err("scheme-less base URL must be rejected");
    assert!(matches!(error, AgencyApiError::InvalidBaseUrl(_)));
}

#[test]
fn login_request_is_form_encoded_and_unauthenticated() {
    let client = AuthClient::new(ApiConfig::new("http://auth.test/api/v1/")).expect("client");

    let request = client
        .build_login_request("ada@example.com", "s3cret&more")
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(request.method(), "POST");
    assert_eq!(
        request.url().as_str(),
        "http://auth.test/api/v1/login/access-token"
    );
    assert!(request.headers().get("authorization").is_none());
    assert_eq!(
        request.headers().get("content-type").expect("content type"),
        "application/x-www-form-urlencoded"
    );
    let body = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("buffered body");
    assert_eq!(body, b"username=ada%40example.com&password=s3cret%26more");
}

#[test]
fn users_me_request_carries_bearer_token() {
    let client = AuthClient::new(ApiConfig::auth_default()).expect("client");

    let request = client
        .build_users_me_request(Some("tok-1"))
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(request.method(), "GET");
    assert_eq!(
        request.url().as_str(),
        "http://localhost:8001/api/v1/users/me"
    );
    assert_eq!(
        request.headers().get("authorization").expect("bearer"),
        "Bearer tok-1"
    );
}

#[test]
fn run_agency_request_serializes_agency_type() {
    let client = PipelineClient::new(ApiConfig::pipeline_default()).expect("client");

    let request = client
        .build_run_agency_request(&RunAgencyRequest::new("Draft an NDA", Agency::Legal))
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(request.url().as_str(), "http://localhost:8002/run-agency");
    let body = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("buffered body");
    let json: serde_json::Value = serde_json::from_slice(body).expect("json body");
    assert_eq!(
        json,
        serde_json::json!({"prompt": "Draft an NDA", "agency_type": "legal"})
    );
}

#[test]
fn agency_parses_case_insensitively() {
    assert_eq!("Legal".parse::<Agency>(), Ok(Agency::Legal));
    assert_eq!(" design ".parse::<Agency>(), Ok(Agency::Design));
    let error = "marketing".parse::<Agency>().expect_err("unknown agency");
    assert_eq!(
        error.to_string(),
        "unknown agency 'marketing'; expected 'legal' or 'design'"
    );
}

#[tokio::test]
async fn document_upload_from_path_keeps_only_the_file_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nda-draft.pdf");
    std::fs::write(&path, b"%PDF-1.4 contract").expect("write document");

    let upload = DocumentUpload::from_path(&path).await.expect("read document");

    assert_eq!(upload.file_name, "nda-draft.pdf");
    assert_eq!(upload.bytes, b"%PDF-1.4 contract");
    assert_eq!(upload.len(), 17);
}

#[tokio::test]
async fn document_upload_from_missing_path_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let error = DocumentUpload::from_path(dir.path().join("missing.txt"))
        .await
        .expect_err("missing file");
    assert_eq!(error.kind(), std::io::ErrorKind::NotFound);
}
