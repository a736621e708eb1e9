use std::sync::{Arc, Mutex};

use actix_web::{App, http::StatusCode, test, web};
use assert_json_diff::{assert_json_eq, assert_json_include};
use async_trait::async_trait;
use lazy_static::lazy_static;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use oj_harness::config::{Config, LanguageConfig};
use oj_harness::error::TransportError;
use oj_harness::harness::GeneratedSource;
use oj_harness::orchestrator::Orchestrator;
use oj_harness::protocol::JUDGE_DELIMITER;
use oj_harness::routes;
use oj_harness::sandbox::{RawRunOutput, SandboxClient};

lazy_static! {
    static ref ACCEPTED_STDOUT: String = format!(
        "hello\n{JUDGE_DELIMITER}\n{}\n",
        json!({
            "verdict": "AC",
            "error": null,
            "time": "0.04ms",
            "memory": "8.50MB",
            "testResults": [
                {"input": "nums=[2, 7, 11, 15], target=9", "expected": "[0, 1]", "actual": "[0, 1]", "passed": true, "error": null, "time": 0.02},
                {"input": "nums=[3, 2, 4], target=6", "expected": "[1, 2]", "actual": "[1, 2]", "passed": true, "error": null, "time": 0.02}
            ]
        })
    );
}

// Mock sandbox that records every program it is asked to run
struct MockSandbox {
    stdout: String,
    received: Mutex<Vec<GeneratedSource>>,
}

#[async_trait]
impl SandboxClient for MockSandbox {
    async fn execute(
        &self,
        source: &GeneratedSource,
        _language: &LanguageConfig,
    ) -> Result<RawRunOutput, TransportError> {
        self.received.lock().unwrap().push(source.clone());
        Ok(RawRunOutput {
            stdout: self.stdout.clone(),
            ..Default::default()
        })
    }
}

fn mock_sandbox() -> Arc<MockSandbox> {
    Arc::new(MockSandbox {
        stdout: ACCEPTED_STDOUT.clone(),
        received: Mutex::new(Vec::new()),
    })
}

fn orchestrator(sandbox: Arc<MockSandbox>) -> web::Data<Orchestrator> {
    let config = Config::load("data/example.json").unwrap();
    web::Data::new(Orchestrator::from_config(config, sandbox))
}

#[actix_web::test]
async fn test_post_submission() {
    let sandbox = mock_sandbox();
    let app = test::init_service(
        App::new()
            .app_data(orchestrator(sandbox.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/submissions")
        .set_json(json!({
            "source_code": "class Solution:\n    pass\n",
            "problem_id": "1",
            "language": "python"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_json_include!(
        actual: body.clone(),
        expected: json!({
            "submission": {
                "source_code": "class Solution:\n    pass\n",
                "problem_id": "1",
                "language": "python"
            },
            "result": {
                "verdict": "AC",
                "userOutput": "hello\n",
                "error": null,
                "elapsedSummary": "0.04ms",
                "memorySummary": "8.50MB"
            }
        })
    );
    assert_eq!(body["result"]["testResults"].as_array().unwrap().len(), 2);
    assert!(body["created_time"].as_str().unwrap().ends_with('Z'));

    let received = sandbox.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].file_name, "main.py");
    assert!(received[0].content.contains("class Solution:\n    pass\n"));
    assert_eq!(received[0].content.matches(JUDGE_DELIMITER).count(), 1);
}

#[actix_web::test]
async fn test_post_submission_not_found() {
    let sandbox = mock_sandbox();
    let app = test::init_service(
        App::new()
            .app_data(orchestrator(sandbox.clone()))
            .configure(routes::configure),
    )
    .await;

    for (problem_id, language) in [("42", "python"), ("1", "rust"), ("1", "")] {
        let req = test::TestRequest::post()
            .uri("/submissions")
            .set_json(json!({
                "source_code": "",
                "problem_id": problem_id,
                "language": language
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{problem_id}/{language}");
        let body: Value = test::read_body_json(resp).await;
        assert_json_eq!(body, json!({"reason": "ERR_NOT_FOUND", "code": 3}));
    }

    assert!(sandbox.received.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn test_post_submission_malformed_json() {
    let app = test::init_service(
        App::new()
            .app_data(orchestrator(mock_sandbox()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/submissions")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"source_code": 1}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_json_eq!(body, json!({"reason": "ERR_INVALID_ARGUMENT", "code": 1}));
}

#[actix_web::test]
async fn test_get_problems() {
    let app = test::init_service(
        App::new()
            .app_data(orchestrator(mock_sandbox()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/problems").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_json_eq!(
        body,
        json!([
            {"id": "1", "name": "Two Sum", "case_count": 2, "languages": ["python", "java", "c"]},
            {"id": "2", "name": "Valid Parentheses", "case_count": 3, "languages": ["python", "java", "c"]},
            {"id": "3", "name": "Best Time to Buy and Sell Stock", "case_count": 2, "languages": ["python", "java", "c"]}
        ])
    );
}

#[actix_web::test]
async fn test_get_starter() {
    let app = test::init_service(
        App::new()
            .app_data(orchestrator(mock_sandbox()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/problems/3/starter?language=java")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["language"], "java");
    assert_eq!(
        body["code"],
        "class Solution {\n    public int maxProfit(int[] prices) {\n        // Write your code here\n        return 0;\n    }\n}\n"
    );

    let req = test::TestRequest::get()
        .uri("/problems/1/starter?language=c")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(
        body["code"]
            .as_str()
            .unwrap()
            .starts_with("int* twoSum(int* nums, int numsSize, int target, int* returnSize) {")
    );

    let req = test::TestRequest::get()
        .uri("/problems/1/starter?language=cobol")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/problems/1/starter")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/problems/9/starter?language=python")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
