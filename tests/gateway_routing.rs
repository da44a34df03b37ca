//! End-to-end routing tests against mock environments.

use std::time::Duration;

use serde_json::Value;

mod common;

use common::{CheckBehavior, MockEnvironment};

const ONPREM: &str = "onprem";
const GCP: &str = "gcp";

struct Harness {
    primary: MockEnvironment,
    secondary: MockEnvironment,
    journal: common::Journal,
    url: String,
    shutdown: ownership_gateway::Shutdown,
}

async fn harness(primary: CheckBehavior, secondary: CheckBehavior) -> Harness {
    harness_with(primary, secondary, |_| {}).await
}

async fn harness_with(
    primary: CheckBehavior,
    secondary: CheckBehavior,
    tune: impl FnOnce(&mut ownership_gateway::GatewayConfig),
) -> Harness {
    let journal = common::journal();
    let primary = common::start_environment(ONPREM, primary, &journal).await;
    let secondary = common::start_environment(GCP, secondary, &journal).await;
    let mut config = common::test_config(&primary.base_url(), &secondary.base_url());
    tune(&mut config);
    let (addr, shutdown) = common::start_gateway(config).await;
    Harness {
        primary,
        secondary,
        journal,
        url: format!("http://{}", addr),
        shutdown,
    }
}

async fn envelope(res: reqwest::Response) -> Value {
    assert_eq!(
        res.headers()["content-type"], "application/json",
        "error responses carry a JSON envelope"
    );
    res.json().await.unwrap()
}

#[tokio::test]
async fn missing_identity_is_rejected_without_backend_calls() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(true)).await;

    let res = common::client()
        .post(format!("{}/orders?user=42", h.url))
        .header("content-type", "application/json")
        .body(r#"{"name":"no email here"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body = envelope(res).await;
    assert_eq!(body.as_object().unwrap().len(), 3);
    assert_eq!(body["error"], "missing_identity");
    assert_eq!(body["status"], 400);
    assert!(body["message"].is_string());

    assert_eq!(h.primary.check_calls(), 0);
    assert_eq!(h.secondary.check_calls(), 0);
    assert!(h.journal.lock().unwrap().is_empty());
    h.shutdown.trigger();
}

#[tokio::test]
async fn primary_owner_never_consults_secondary() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(true)).await;

    let res = common::client()
        .get(format!("{}/profile", h.url))
        .header("x-user-email", "ana@example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers()["x-environment"], ONPREM);
    assert_eq!(h.primary.check_calls(), 1);
    assert_eq!(h.primary.checked()[0]["email"], "ana@example.com");
    assert_eq!(h.secondary.check_calls(), 0);
    assert!(h.secondary.forwarded().is_empty());
    h.shutdown.trigger();
}

#[tokio::test]
async fn secondary_owner_receives_original_path() {
    let h = harness(CheckBehavior::Exists(false), CheckBehavior::Exists(true)).await;

    let res = common::client()
        .get(format!("{}/api/v1/items?email=ana%40example.com&page=2", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers()["x-environment"], GCP);

    let forwarded = h.secondary.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].path_and_query, "/api/v1/items?email=ana%40example.com&page=2");
    assert_eq!(forwarded[0].headers["host"], h.secondary.addr.to_string().as_str());
    assert!(h.primary.forwarded().is_empty());
    assert_eq!(h.secondary.checked()[0]["email"], "ana@example.com");
    h.shutdown.trigger();
}

#[tokio::test]
async fn denied_everywhere_is_not_found_after_two_ordered_checks() {
    let h = harness(CheckBehavior::Exists(false), CheckBehavior::Exists(false)).await;

    let res = common::client()
        .get(format!("{}/profile?email=ghost@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    let body = envelope(res).await;
    assert_eq!(body["error"], "user_not_found");
    assert_eq!(body["status"], 404);

    assert_eq!(
        *h.journal.lock().unwrap(),
        vec!["onprem:checkUser".to_string(), "gcp:checkUser".to_string()]
    );
    h.shutdown.trigger();
}

#[tokio::test]
async fn unreachable_primary_fails_fast() {
    let journal = common::journal();
    let dead = common::closed_addr().await;
    let secondary = common::start_environment(GCP, CheckBehavior::Exists(true), &journal).await;
    let config = common::test_config(&format!("http://{}", dead), &secondary.base_url());
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{}/profile?email=ana@example.com", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body = envelope(res).await;
    assert_eq!(body["error"], "ownership_check_failed");
    assert_eq!(body["status"], 500);
    assert_eq!(secondary.check_calls(), 0);
    assert!(secondary.forwarded().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn slow_primary_check_times_out_without_failover() {
    let h = harness(
        CheckBehavior::Stall(Duration::from_secs(2)),
        CheckBehavior::Exists(true),
    )
    .await;

    let res = common::client()
        .get(format!("{}/profile?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(envelope(res).await["error"], "ownership_check_failed");
    assert_eq!(h.secondary.check_calls(), 0);
    h.shutdown.trigger();
}

#[tokio::test]
async fn undecodable_or_failed_check_is_an_error_not_a_denial() {
    for behavior in [
        CheckBehavior::Reply(200, "<html>maybe</html>"),
        CheckBehavior::Reply(503, r#"{"exists":true}"#),
    ] {
        let h = harness(behavior, CheckBehavior::Exists(true)).await;

        let res = common::client()
            .get(format!("{}/profile?email=ana@example.com", h.url))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 500);
        assert_eq!(h.secondary.check_calls(), 0);
        h.shutdown.trigger();
    }
}

#[tokio::test]
async fn non_boolean_exists_counts_as_denial() {
    let h = harness(
        CheckBehavior::Reply(200, r#"{"exists":"true","success":true}"#),
        CheckBehavior::Exists(true),
    )
    .await;

    let res = common::client()
        .get(format!("{}/profile?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers()["x-environment"], GCP);
    assert_eq!(h.primary.check_calls(), 1);
    assert_eq!(h.secondary.check_calls(), 1);
    h.shutdown.trigger();
}

#[tokio::test]
async fn backend_response_is_relayed_for_each_method() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(false)).await;
    let client = common::client();

    let get = client
        .get(format!("{}/things/1?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();
    let post = client
        .post(format!("{}/things", h.url))
        .header("content-type", "application/json")
        .body(r#"{"email":"ana@example.com","qty":3}"#)
        .send()
        .await
        .unwrap();
    let delete = client
        .delete(format!("{}/things/1", h.url))
        .header("x-user-email", "ana@example.com")
        .send()
        .await
        .unwrap();

    for res in [get, post, delete] {
        assert_eq!(res.status(), 418);
        assert_eq!(res.headers()["x-test"], "v");
        assert_eq!(&res.bytes().await.unwrap()[..], br#"{"ok":false}"#);
    }

    let forwarded = h.primary.forwarded();
    assert_eq!(forwarded.len(), 3);

    assert_eq!(forwarded[0].method, "GET");
    assert_eq!(forwarded[0].path_and_query, "/things/1?email=ana@example.com");
    assert!(forwarded[0].body.is_empty());

    assert_eq!(forwarded[1].method, "POST");
    assert_eq!(forwarded[1].path_and_query, "/things");
    assert_eq!(&forwarded[1].body[..], br#"{"email":"ana@example.com","qty":3}"#);
    assert_eq!(forwarded[1].headers["content-type"], "application/json");

    assert_eq!(forwarded[2].method, "DELETE");
    assert!(forwarded[2].body.is_empty());
    h.shutdown.trigger();
}

#[tokio::test]
async fn backend_errors_pass_through_untouched() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(false)).await;

    let res = common::client()
        .get(format!("{}/fail?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "backend exploded");
    h.shutdown.trigger();
}

#[tokio::test]
async fn forward_timeout_is_bad_gateway() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(false)).await;

    let res = common::client()
        .get(format!("{}/slow?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body = envelope(res).await;
    assert_eq!(body["error"], "upstream_unreachable");
    assert_eq!(body["status"], 502);
    assert_eq!(h.primary.forwarded().len(), 1, "no retry after a failed forward");
    h.shutdown.trigger();
}

#[tokio::test]
async fn only_allow_listed_headers_reach_the_backend() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(false)).await;

    let res = common::client()
        .get(format!("{}/profile", h.url))
        .header("x-user-email", "ana@example.com")
        .header("authorization", "Bearer abc")
        .header("x-correlation-id", "corr-9")
        .header("x-request-id", "req-9")
        .header("cookie", "session=secret")
        .header("x-internal-debug", "1")
        .header("accept", "application/xml")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers()["x-request-id"], "req-9");

    let headers = &h.primary.forwarded()[0].headers;
    assert_eq!(headers["x-user-email"], "ana@example.com");
    assert_eq!(headers["authorization"], "Bearer abc");
    assert_eq!(headers["x-correlation-id"], "corr-9");
    assert_eq!(headers["x-request-id"], "req-9");
    assert!(headers.get("cookie").is_none());
    assert!(headers.get("x-internal-debug").is_none());
    assert!(headers.get("accept").is_none());
    assert!(headers.get("user-agent").is_none());
    h.shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected_with_an_envelope() {
    let h = harness_with(
        CheckBehavior::Exists(true),
        CheckBehavior::Exists(true),
        |config| config.limits.max_body_bytes = 16,
    )
    .await;

    let res = common::client()
        .post(format!("{}/orders", h.url))
        .header("x-user-email", "ana@example.com")
        .header("content-type", "application/octet-stream")
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 413);
    let body = envelope(res).await;
    assert_eq!(body["error"], "payload_too_large");
    assert_eq!(body["status"], 413);
    assert_eq!(h.primary.check_calls(), 0);
    assert!(h.journal.lock().unwrap().is_empty());
    h.shutdown.trigger();
}

#[tokio::test]
async fn overall_deadline_answers_with_an_envelope() {
    let h = harness_with(
        CheckBehavior::Stall(Duration::from_secs(2)),
        CheckBehavior::Exists(true),
        |config| {
            config.timeouts.check_ms = 1_000;
            config.timeouts.request_ms = 200;
        },
    )
    .await;

    let res = common::client()
        .get(format!("{}/profile?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 408);
    let body = envelope(res).await;
    assert_eq!(body["error"], "request_timeout");
    assert_eq!(body["status"], 408);
    assert_eq!(h.secondary.check_calls(), 0);
    h.shutdown.trigger();
}

#[tokio::test]
async fn request_id_is_generated_and_forwarded() {
    let h = harness(CheckBehavior::Exists(true), CheckBehavior::Exists(false)).await;

    let res = common::client()
        .get(format!("{}/profile?email=ana@example.com", h.url))
        .send()
        .await
        .unwrap();

    let id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(h.primary.forwarded()[0].headers["x-request-id"], id.as_str());
    h.shutdown.trigger();
}

#[tokio::test]
async fn body_identity_takes_precedence() {
    let h = harness(
        CheckBehavior::OwnsSuffix("@onprem.example"),
        CheckBehavior::OwnsSuffix("@cloud.example"),
    )
    .await;

    let res = common::client()
        .post(format!("{}/orders?email=bob@onprem.example", h.url))
        .header("x-user-email", "bob@onprem.example")
        .body(r#"{"email":"ana@cloud.example"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers()["x-environment"], GCP);
    assert_eq!(h.primary.checked()[0]["email"], "ana@cloud.example");
    h.shutdown.trigger();
}
