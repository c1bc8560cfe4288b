//! Payback integration tests.

mod common;

use axum::http::{HeaderValue, StatusCode};
use common::{authorization, payback_body, TestHarness};
use serde_json::{json, Value};

const CODE: &str = "ABCDEFGH";

/// Harness with deposits of 100 and -50 on `CODE`, plus the operator's auth.
async fn funded() -> (TestHarness, HeaderValue) {
    let harness = TestHarness::new();
    let operator = harness.operator().await;
    harness.deposit(&operator, 100, CODE).await;
    harness.deposit(&operator, -50, CODE).await;
    (harness, operator)
}

async fn pay_back(harness: &TestHarness, auth: &HeaderValue, amount: i64) -> axum_test::TestResponse {
    harness
        .server
        .post("/posts/cdppayback/")
        .add_header(authorization(), auth.clone())
        .json(&payback_body(amount, CODE))
        .await
}

async fn balance_message(harness: &TestHarness, code: &str) -> String {
    let response = harness
        .server
        .get(&format!("/posts/cdppayback/code/balance/{code}"))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Threshold
// ============================================================================

#[tokio::test]
async fn payback_within_threshold_then_overdraw() {
    let (harness, operator) = funded().await;

    let first = pay_back(&harness, &operator, 100).await;
    first.assert_status(StatusCode::CREATED);
    let body: Value = first.json();
    assert_eq!(body["amount"], 100);
    assert_eq!(body["code"], CODE);

    let second = pay_back(&harness, &operator, 60).await;
    second.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        second.json::<Value>()["message"],
        "you are paying back more than the threshold of this code"
    );

    assert_eq!(
        balance_message(&harness, CODE).await,
        "Balance of code ABCDEFGH is 50"
    );
}

#[tokio::test]
async fn payback_may_reach_exact_threshold() {
    let (harness, operator) = funded().await;

    pay_back(&harness, &operator, 150)
        .await
        .assert_status(StatusCode::CREATED);

    assert_eq!(
        balance_message(&harness, CODE).await,
        "Balance of code ABCDEFGH is 0"
    );
}

#[tokio::test]
async fn negative_payback_counts_by_magnitude() {
    let (harness, operator) = funded().await;

    pay_back(&harness, &operator, -120)
        .await
        .assert_status(StatusCode::CREATED);

    pay_back(&harness, &operator, 31)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(
        balance_message(&harness, CODE).await,
        "Balance of code ABCDEFGH is 30"
    );
}

#[tokio::test]
async fn payback_for_unknown_code_is_not_found() {
    let harness = TestHarness::new();
    let operator = harness.operator().await;

    harness
        .server
        .post("/posts/cdppayback")
        .add_header(authorization(), operator)
        .json(&payback_body(10, "NOSUCHCODE"))
        .await
        .assert_status_not_found();
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn member_cannot_record_payback() {
    let (harness, _) = funded().await;
    let member = harness.member().await;

    let response = pay_back(&harness, &member, 10).await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["message"], "you are not allowed");
}

#[tokio::test]
async fn payback_requires_auth() {
    let (harness, _) = funded().await;

    harness
        .server
        .post("/posts/cdppayback/")
        .json(&payback_body(10, CODE))
        .await
        .assert_status_unauthorized();
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn list_get_and_filter_by_code() {
    let (harness, operator) = funded().await;
    pay_back(&harness, &operator, 10).await.assert_status(StatusCode::CREATED);
    pay_back(&harness, &operator, 20).await.assert_status(StatusCode::CREATED);

    let all: Vec<Value> = harness.server.get("/posts/cdppayback").await.json();
    assert_eq!(all.len(), 2);

    let second: Value = harness.server.get("/posts/cdppayback/2").await.json();
    assert_eq!(second["amount"], 20);

    let by_code: Vec<Value> = harness
        .server
        .get(&format!("/posts/cdppayback/code/{CODE}"))
        .await
        .json();
    assert_eq!(by_code.len(), 2);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let (harness, _) = funded().await;

    harness
        .server
        .get("/posts/cdppayback/1")
        .await
        .assert_status_not_found();
    harness
        .server
        .get(&format!("/posts/cdppayback/code/{CODE}"))
        .await
        .assert_status_not_found();
    harness
        .server
        .get("/posts/cdppayback/code/balance/NOSUCHCODE")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn balance_without_paybacks_is_deposit_total() {
    let (harness, _) = funded().await;

    assert_eq!(
        balance_message(&harness, CODE).await,
        "Balance of code ABCDEFGH is 150"
    );
}

#[tokio::test]
async fn backdated_payback_keeps_client_timestamp() {
    let (harness, operator) = funded().await;

    let mut body = payback_body(10, CODE);
    body["created_at"] = json!("2022-04-04T22:14:45Z");

    let response = harness
        .server
        .post("/posts/cdppayback/")
        .add_header(authorization(), operator)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>()["created_at"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(created.starts_with("2022-04-04T22:14:45"));
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn operator_publishes_payback() {
    let (harness, operator) = funded().await;
    pay_back(&harness, &operator, 10).await.assert_status(StatusCode::CREATED);

    let response = harness
        .server
        .put("/posts/cdppayback/1")
        .add_header(authorization(), operator)
        .json(&json!({ "published": true }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["published"], true);
    assert_eq!(body["amount"], 10);
}

#[tokio::test]
async fn amount_update_is_checked_against_threshold() {
    let (harness, operator) = funded().await;
    pay_back(&harness, &operator, 100).await.assert_status(StatusCode::CREATED);

    // The row's own 100 is replaced, not added to
    harness
        .server
        .put("/posts/cdppayback/1")
        .add_header(authorization(), operator.clone())
        .json(&json!({ "amount": 150 }))
        .await
        .assert_status_ok();

    harness
        .server
        .put("/posts/cdppayback/1")
        .add_header(authorization(), operator)
        .json(&json!({ "amount": 151 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(
        balance_message(&harness, CODE).await,
        "Balance of code ABCDEFGH is 0"
    );
}

#[tokio::test]
async fn update_reports_missing_payback_before_permission() {
    let (harness, operator) = funded().await;
    pay_back(&harness, &operator, 10).await.assert_status(StatusCode::CREATED);
    let member = harness.member().await;

    harness
        .server
        .put("/posts/cdppayback/9")
        .add_header(authorization(), member.clone())
        .json(&json!({ "published": true }))
        .await
        .assert_status_not_found();

    harness
        .server
        .put("/posts/cdppayback/1")
        .add_header(authorization(), member)
        .json(&json!({ "published": true }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
