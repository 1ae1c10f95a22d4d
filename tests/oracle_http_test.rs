mod helpers;

use helpers::{ask, test_settings};
use std::sync::Arc;
use std::time::Duration;
use watson::agent::WatsonAgent;
use watson::case::CaseFile;
use watson::config::OracleConfig;
use watson::investigation::types::Severity;
use watson::oracle::{self, HttpOracle, Oracle, OracleError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, provider: &str) -> OracleConfig {
    OracleConfig {
        provider: provider.into(),
        api_base: Some(server.uri()),
        api_key: Some("test-key".into()),
        max_retries: 2,
        backoff_base_ms: 1,
        request_timeout_secs: 5,
        ..OracleConfig::default()
    }
}

fn anthropic_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "msg_test123",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "model": "claude-sonnet-4-5",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 20}
    })
}

fn anthropic_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "type": "error",
        "error": {"type": "api_error", "message": message}
    }))
}

#[tokio::test]
async fn anthropic_summary_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_reply("Thomas is hiding something.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server, "anthropic"), "test-key").unwrap();
    let text = oracle.summarize("What do you make of Thomas?").await.unwrap();
    assert_eq!(text, "Thomas is hiding something.");
}

#[tokio::test]
async fn openai_summary_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "The butler was in the pantry."},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server, "openai"), "test-key").unwrap();
    let text = oracle.summarize("Where was James?").await.unwrap();
    assert_eq!(text, "The butler was in the pantry.");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_error(500, "overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server, "anthropic"), "test-key").unwrap();
    assert_eq!(oracle.summarize("hello").await.unwrap(), "recovered");
}

#[tokio::test]
async fn timed_out_attempts_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_reply("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("on time")))
        .expect(1)
        .mount(&server)
        .await;

    let config = OracleConfig {
        request_timeout_secs: 1,
        ..config_for(&server, "anthropic")
    };
    let oracle = HttpOracle::new(&config, "test-key").unwrap();
    assert_eq!(oracle.summarize("hello").await.unwrap(), "on time");
}

#[tokio::test]
async fn auth_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_error(401, "invalid x-api-key"))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server, "anthropic"), "test-key").unwrap();
    match oracle.summarize("hello").await {
        Err(OracleError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid x-api-key");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn retries_give_up_eventually() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_error(503, "unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let oracle = HttpOracle::new(&config_for(&server, "anthropic"), "test-key").unwrap();
    let err = oracle.summarize("hello").await.unwrap_err();
    assert!(matches!(err, OracleError::Http { status: 503, .. }));
}

#[tokio::test]
async fn verdict_embedded_in_prose_is_parsed() {
    let server = MockServer::start().await;
    let reply = "Having weighed both accounts:\n```json\n{\"isContradiction\": true, \"type\": \"location\", \
                 \"severity\": \"critical\", \"explanation\": \"Both claim the study.\", \"confidence\": 0.85}\n```";
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply(reply)))
        .mount(&server)
        .await;

    let oracle = oracle::create_oracle(&config_for(&server, "anthropic")).unwrap();
    let mut agent = WatsonAgent::new(Arc::new(CaseFile::default()), oracle, test_settings());

    ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the study at 11:15.").await;
    let turn = ask(&mut agent, "eleanor", "Where were you at 11:15?", "I was in the study at 11:15, alone.").await;

    assert_eq!(turn.new_contradictions.len(), 1);
    let c = &turn.new_contradictions[0];
    assert_eq!(c.severity, Severity::Critical);
    assert_eq!(c.explanation, "Both claim the study.");
    assert_eq!(c.confidence, 0.85);
}

#[test]
fn missing_api_key_is_a_config_error() {
    let config = OracleConfig {
        provider: "anthropic".into(),
        api_key: None,
        api_key_env: "WATSON_TEST_KEY_THAT_IS_NEVER_SET".into(),
        ..OracleConfig::default()
    };
    assert!(oracle::create_oracle(&config).is_err());

    let unknown = OracleConfig {
        provider: "carrier-pigeon".into(),
        ..OracleConfig::default()
    };
    assert!(oracle::create_oracle(&unknown).is_err());
}
