//! Step Functions client against a local HTTP server.

use flowdeploy_config::ClientOptions;
use flowdeploy_task::{
  AwsCredentials, ExecutionParams, SfnClient, StartExecutionRequest, StepActivate, StepFunctions,
  TaskError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(server: &MockServer) -> ClientOptions {
  ClientOptions {
    region: Some("us-east-1".to_string()),
    endpoint_url: Some(server.uri()),
  }
}

fn started() -> serde_json::Value {
  json!({
    "executionArn": "arn:aws:states:us-east-1:123456789012:execution:Example:exec-1",
    "startDate": 1.6e9,
  })
}

#[tokio::test]
async fn test_start_execution_is_signed_json_rpc() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/"))
    .and(header("x-amz-target", "AWSStepFunctions.StartExecution"))
    .and(header("content-type", "application/x-amz-json-1.0"))
    .and(header_exists("x-amz-date"))
    .and(header_regex(
      "authorization",
      r"^AWS4-HMAC-SHA256 Credential=AKID/\d{8}/us-east-1/states/aws4_request",
    ))
    .and(header_regex(
      "authorization",
      "SignedHeaders=content-type;host;x-amz-date;x-amz-target",
    ))
    .and(header_regex("authorization", "Signature=[0-9a-f]{64}"))
    .and(body_json(json!({
      "stateMachineArn": "arn:test:sm",
      "name": "exec-1",
      "input": "{\"a\":1}",
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(started()))
    .expect(1)
    .mount(&server)
    .await;

  let client = SfnClient::new(
    AwsCredentials::new("AKID", "secret"),
    "us-east-1",
    &options(&server),
  )
  .unwrap();
  let request = StartExecutionRequest {
    state_machine_arn: "arn:test:sm".to_string(),
    name: Some("exec-1".to_string()),
    input: Some(r#"{"a":1}"#.to_string()),
  };

  let response = client.start_execution(&request).await.unwrap();
  assert_eq!(response, started());
}

#[tokio::test]
async fn test_session_token_sent() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(header("x-amz-security-token", "session"))
    .and(header_regex("authorization", "x-amz-security-token;x-amz-target"))
    .respond_with(ResponseTemplate::new(200).set_body_json(started()))
    .expect(1)
    .mount(&server)
    .await;

  let mut credentials = AwsCredentials::new("AKID", "secret");
  credentials.session_token = Some("session".to_string());
  let client = SfnClient::new(credentials, "us-east-1", &options(&server)).unwrap();

  let request = StartExecutionRequest {
    state_machine_arn: "arn:test:sm".to_string(),
    name: None,
    input: None,
  };
  client.start_execution(&request).await.unwrap();
}

#[tokio::test]
async fn test_error_status_becomes_service_error() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(400).set_body_json(json!({
      "__type": "com.amazonaws.swf.base.model#StateMachineDoesNotExist",
      "message": "State Machine Does Not Exist",
    })))
    .mount(&server)
    .await;

  let client = SfnClient::new(
    AwsCredentials::new("AKID", "secret"),
    "us-east-1",
    &options(&server),
  )
  .unwrap();
  let request = StartExecutionRequest {
    state_machine_arn: "arn:test:missing".to_string(),
    name: None,
    input: None,
  };

  match client.start_execution(&request).await {
    Err(TaskError::Service {
      status,
      code,
      message,
    }) => {
      assert_eq!(status, 400);
      assert_eq!(code, "StateMachineDoesNotExist");
      assert_eq!(message, "State Machine Does Not Exist");
    }
    other => panic!("expected service error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_step_activate_run_end_to_end() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(header("x-amz-target", "AWSStepFunctions.StartExecution"))
    .and(body_json(json!({
      "stateMachineArn": "arn:aws:states:us-east-1:123456789012:stateMachine:Example",
      "name": "run-7",
      "input": "{\"Parameters\": \"{}\"}",
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(started()))
    .expect(1)
    .mount(&server)
    .await;

  let task = StepActivate::new(
    ExecutionParams {
      state_machine_arn: Some(
        "arn:aws:states:us-east-1:123456789012:stateMachine:Example".to_string(),
      ),
      execution_name: None,
      execution_input: Some(r#"{"Parameters": "{}"}"#.to_string()),
    },
    options(&server),
  );
  let overrides = ExecutionParams {
    execution_name: Some("run-7".to_string()),
    ..ExecutionParams::default()
  };

  let credentials = AwsCredentials::new("AKID", "secret");
  let response = task.run(Some(&credentials), overrides).await.unwrap();
  assert_eq!(response["executionArn"], started()["executionArn"]);
}
