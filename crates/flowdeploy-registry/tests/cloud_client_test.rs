//! GraphQL registration against a local HTTP server.

use std::path::Path;

use flowdeploy_config::{StorageDef, TaskDef, TaskKind};
use flowdeploy_flow::Flow;
use flowdeploy_registry::{CloudClient, CloudConfig, OrchestrationClient, RegistrationError};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CloudClient {
  CloudClient::new(CloudConfig {
    api_url: server.uri(),
    api_key: Some("secret-key".to_string()),
  })
}

fn flow(directory: &Path) -> Flow {
  let mut flow = Flow::builder("hello")
    .task(TaskDef::new("greet", TaskKind::Log { message: None }))
    .build()
    .unwrap();
  flow.storage = Some(StorageDef::local(directory));
  flow
}

fn file_count(directory: &Path) -> usize {
  if !directory.exists() {
    return 0;
  }
  walk(directory)
}

fn walk(directory: &Path) -> usize {
  std::fs::read_dir(directory)
    .unwrap()
    .map(|e| e.unwrap().path())
    .map(|p| if p.is_dir() { walk(&p) } else { 1 })
    .sum()
}

async fn mount_project(server: &MockServer, projects: Value) {
  Mock::given(method("POST"))
    .and(body_string_contains("project(where"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"project": projects}})))
    .mount(server)
    .await;
}

#[tokio::test]
async fn test_register_uploads_then_creates_flow() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  mount_project(&server, json!([{"id": "p-1"}])).await;
  Mock::given(method("POST"))
    .and(header("authorization", "Bearer secret-key"))
    .and(body_string_contains("create_flow"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({"data": {"create_flow": {"id": "f-42"}}})),
    )
    .expect(1)
    .mount(&server)
    .await;

  let id = client(&server)
    .register(&flow(dir.path()), "data-platform")
    .await
    .unwrap();
  assert_eq!(id.0, "f-42");
  assert_eq!(file_count(dir.path()), 1);

  let requests = server.received_requests().await.unwrap();
  assert_eq!(requests.len(), 2);
  let lookup: Value = serde_json::from_slice(&requests[0].body).unwrap();
  assert_eq!(lookup["variables"]["name"], "data-platform");

  let create: Value = serde_json::from_slice(&requests[1].body).unwrap();
  let input = &create["variables"]["input"];
  assert_eq!(input["project_id"], "p-1");
  assert_eq!(input["idempotency_key"].as_str().unwrap().len(), 64);
  assert_eq!(input["serialized_flow"]["name"], "hello");

  // The registered flow points at the uploaded artifact.
  let key = input["serialized_flow"]["storage"]["key"].as_str().unwrap();
  assert!(key.starts_with("hello/"));
  assert!(dir.path().join(key).is_file());
}

#[tokio::test]
async fn test_unknown_project_uploads_nothing() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  let artifacts = dir.path().join("artifacts");
  mount_project(&server, json!([])).await;
  Mock::given(method("POST"))
    .and(body_string_contains("create_flow"))
    .respond_with(ResponseTemplate::new(200))
    .expect(0)
    .mount(&server)
    .await;

  match client(&server).register(&flow(&artifacts), "missing").await {
    Err(RegistrationError::ProjectNotFound(name)) => assert_eq!(name, "missing"),
    other => panic!("expected ProjectNotFound, got {:?}", other),
  }
  assert_eq!(file_count(&artifacts), 0);
}

#[tokio::test]
async fn test_graphql_errors_are_rejections() {
  let server = MockServer::start().await;
  let dir = tempfile::tempdir().unwrap();
  mount_project(&server, json!([{"id": "p-1"}])).await;
  Mock::given(method("POST"))
    .and(body_string_contains("create_flow"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "data": null,
      "errors": [{"message": "Invalid flow"}],
    })))
    .mount(&server)
    .await;

  match client(&server).register(&flow(dir.path()), "data-platform").await {
    Err(RegistrationError::Rejected(message)) => assert_eq!(message, "Invalid flow"),
    other => panic!("expected Rejected, got {:?}", other),
  }
}

#[tokio::test]
async fn test_http_error_status() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
    .mount(&server)
    .await;

  let dir = tempfile::tempdir().unwrap();
  match client(&server).register(&flow(dir.path()), "data-platform").await {
    Err(RegistrationError::Status { status, body }) => {
      assert_eq!(status, 502);
      assert_eq!(body, "bad gateway");
    }
    other => panic!("expected Status, got {:?}", other),
  }
}
