use bitaudit_llm::openai::OpenAiClient;
use bitaudit_llm::sonar::SonarClient;
use bitaudit_llm::traits::LlmClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn openai_client_reads_output_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o",
            "output": [
                {
                    "content": [
                        {"type": "reasoning", "text": ""},
                        {"type": "output_text", "text": "1. Paris is the capital of France."}
                    ]
                }
            ],
            "usage": {"total_tokens": 42}
        })))
        .mount(&server)
        .await;

    let client =
        OpenAiClient::with_base_url("sk-test".into(), "gpt-4o".into(), &format!("{}/", server.uri()))
            .unwrap();

    let resp = client.generate("decompose this", None, None, Some(0.7)).await.unwrap();
    assert_eq!(resp.text, "1. Paris is the capital of France.");
    assert_eq!(resp.model.as_deref(), Some("gpt-4o"));
    assert_eq!(resp.tokens_used, Some(42));
}

#[tokio::test]
async fn openai_client_surfaces_api_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .mount(&server)
        .await;

    let client =
        OpenAiClient::with_base_url("sk-test".into(), "gpt-4o".into(), &format!("{}/", server.uri()))
            .unwrap();

    let err = client.generate("hi", None, None, None).await.unwrap_err();
    assert!(err.to_string().contains("bad key"), "got: {err}");
}

#[tokio::test]
async fn sonar_client_reads_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "sonar-pro",
            "choices": [
                {"message": {"role": "assistant", "content": "Score: 4, Explanation: The museum opened in 1931, not 1929."}}
            ],
            "usage": {"total_tokens": 18}
        })))
        .mount(&server)
        .await;

    let client =
        SonarClient::with_base_url("pplx-test".into(), "sonar-pro".into(), &format!("{}/", server.uri()))
            .unwrap();

    let resp = client
        .generate("country: united states, city: new york, fact", Some("score it"), None, None)
        .await
        .unwrap();
    assert!(resp.text.starts_with("Score: 4"));
    assert_eq!(resp.tokens_used, Some(18));
}

#[tokio::test]
async fn sonar_client_handles_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client =
        SonarClient::with_base_url("pplx-test".into(), "sonar-pro".into(), &format!("{}/", server.uri()))
            .unwrap();

    let resp = client.generate("fact", None, None, None).await.unwrap();
    assert!(resp.text.is_empty());
    assert_eq!(resp.model.as_deref(), Some("sonar-pro"));
}
