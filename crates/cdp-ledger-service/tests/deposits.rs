//! Deposit (CDP) integration tests.

mod common;

use axum::http::StatusCode;
use common::{authorization, deposit_body, TestHarness};
use serde_json::{json, Value};

const CODE: &str = "ABCDEFGH";

#[tokio::test]
async fn operator_records_deposit() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;

    let body = harness.deposit(&operator, 100, CODE).await;

    assert_eq!(body["stt"], 1);
    assert_eq!(body["amount"], 100);
    assert_eq!(body["code"], CODE);
    assert_eq!(body["published"], false);
}

#[tokio::test]
async fn member_cannot_record_deposit() {
    let harness = TestHarness::new();
    let member = harness.member().await;

    let response = harness
        .server
        .post("/posts/cdp")
        .add_header(authorization(), member)
        .json(&deposit_body(100, CODE))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["message"], "you are not allowed");
}

#[tokio::test]
async fn deposit_requires_auth() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/posts/cdp/")
        .json(&deposit_body(100, CODE))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn margin_bounds_are_inclusive() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;

    for (margin, status) in [
        (0.0, StatusCode::CREATED),
        (1.0, StatusCode::CREATED),
        (-0.01, StatusCode::UNPROCESSABLE_ENTITY),
        (1.01, StatusCode::UNPROCESSABLE_ENTITY),
    ] {
        let mut body = deposit_body(10, CODE);
        body["margin"] = json!(margin);

        harness
            .server
            .post("/posts/cdp/")
            .add_header(authorization(), operator.clone())
            .json(&body)
            .await
            .assert_status(status);
    }
}

#[tokio::test]
async fn code_needs_eight_characters() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;

    harness
        .server
        .post("/posts/cdp/")
        .add_header(authorization(), operator.clone())
        .json(&deposit_body(10, "ABCDEFG"))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    harness.deposit(&operator, 10, "ABCDEFGH").await;
}

#[tokio::test]
async fn list_get_and_filter_by_code() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;
    harness.deposit(&operator, 100, CODE).await;
    harness.deposit(&operator, -50, CODE).await;
    harness.deposit(&operator, 7, "ZYXWVUTS").await;

    let all: Vec<Value> = harness.server.get("/posts/cdp").await.json();
    assert_eq!(all.len(), 3);

    let second: Value = harness.server.get("/posts/cdp/2").await.json();
    assert_eq!(second["amount"], -50);

    let by_code: Vec<Value> = harness
        .server
        .get(&format!("/posts/cdp/code/{CODE}"))
        .await
        .json();
    assert_eq!(by_code.len(), 2);
}

#[tokio::test]
async fn unknown_deposit_or_code_is_not_found() {
    let harness = TestHarness::new();

    harness.server.get("/posts/cdp/5").await.assert_status_not_found();
    harness
        .server
        .get("/posts/cdp/code/NOSUCHCODE")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn operator_publishes_deposit() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;
    harness.deposit(&operator, 100, CODE).await;

    let response = harness
        .server
        .put("/posts/cdp/1")
        .add_header(authorization(), operator)
        .json(&json!({ "published": true }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["published"], true);
    assert_eq!(body["amount"], 100);
}

#[tokio::test]
async fn update_reports_missing_deposit_before_permission() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;
    let member = harness.member().await;
    harness.deposit(&operator, 100, CODE).await;

    harness
        .server
        .put("/posts/cdp/9")
        .add_header(authorization(), member.clone())
        .json(&json!({ "published": true }))
        .await
        .assert_status_not_found();

    harness
        .server
        .put("/posts/cdp/1")
        .add_header(authorization(), member)
        .json(&json!({ "published": true }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
