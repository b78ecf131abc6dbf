use bitaudit_http::{HttpClient, HttpError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn post_json_decodes_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .and(body_json(json!({"ping": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let got: serde_json::Value = client
        .post_json("echo", Some("sk-test"), &json!({"ping": true}))
        .await
        .unwrap();

    assert_eq!(got, json!({"pong": true}));
}

#[tokio::test]
async fn post_json_retries_server_errors() {
    let server = MockServer::start().await;

    // First attempt fails, the retry lands on the healthy mock.
    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let got: serde_json::Value = client.post_json("echo", None, &json!({})).await.unwrap();

    assert_eq!(got, json!({"ok": 1}));
}

#[tokio::test]
async fn post_json_surfaces_provider_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "bad api key"}})),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let err = client
        .post_json::<_, serde_json::Value>("echo", Some("sk-test"), &json!({}))
        .await
        .unwrap_err();

    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "bad api key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
