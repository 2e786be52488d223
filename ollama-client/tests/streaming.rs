//! Streaming delivery against a mock server.

mod common;

use std::sync::{Arc, Mutex};

use ollama_client::{Error, Message, Request, Response, StreamControl};
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{PolicyGuard, blocking, client};

const TWO_FRAMES: &str = "{\"response\":\"he\",\"done\":false}\n{\"response\":\"llo\",\"done\":true,\"context\":[7]}\n";

fn ndjson(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/x-ndjson")
}

async fn mount_generate(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ndjson(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn generate_stream_delivers_frames_in_order() {
    let _guard = PolicyGuard::exceptions(true);
    let server = MockServer::start().await;
    mount_generate(&server, TWO_FRAMES).await;

    let uri = server.uri();
    let (finished, frames) = blocking(move || {
        let mut frames = Vec::new();
        let finished = client(&uri).generate_stream(Request::generate("m", "hi"), |frame: Response| {
            frames.push(frame);
            StreamControl::Continue
        })?;
        Ok::<_, Error>((finished, frames))
    })
    .await
    .expect("stream succeeds");

    assert!(finished);
    let texts: Vec<_> = frames.iter().map(Response::to_string).collect();
    assert_eq!(texts, ["he", "llo"]);
    assert!(!frames[0].is_done());
    assert!(frames[1].is_done());
    assert_eq!(frames[1].context(), Some(&json!([7])));
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn sink_can_stop_the_stream() {
    let _guard = PolicyGuard::exceptions(true);
    let server = MockServer::start().await;
    mount_generate(&server, TWO_FRAMES).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let uri = server.uri();
    let finished = blocking(move || {
        client(&uri).generate_stream(Request::generate("m", "hi"), move |frame: Response| {
            sink_seen.lock().expect("lock").push(frame.to_string());
            StreamControl::Stop
        })
    })
    .await
    .expect("stream succeeds");

    assert!(!finished);
    assert_eq!(*seen.lock().expect("lock"), ["he"]);
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn bool_returning_closures_are_sinks() {
    let _guard = PolicyGuard::exceptions(true);
    let server = MockServer::start().await;
    mount_generate(&server, TWO_FRAMES).await;

    let uri = server.uri();
    let (finished, count) = blocking(move || {
        let mut count = 0;
        let finished = client(&uri).generate_stream(Request::generate("m", "hi"), |_: Response| {
            count += 1;
            true
        })?;
        Ok::<_, Error>((finished, count))
    })
    .await
    .expect("stream succeeds");

    assert!(finished);
    assert_eq!(count, 2);
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn chat_stream_accumulates_content() {
    let _guard = PolicyGuard::exceptions(true);
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ndjson(concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"prompt_eval_count\":4,\"eval_count\":2}\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (text, usage) = blocking(move || {
        let mut text = String::new();
        let mut usage = None;
        client(&uri).chat_stream(
            Request::chat("m", vec![Message::user("hi")]),
            |frame: Response| {
                text.push_str(&frame.as_simple_string());
                if frame.is_done() {
                    usage = frame.usage();
                }
            },
        )?;
        Ok::<_, Error>((text, usage))
    })
    .await
    .expect("stream succeeds");

    assert_eq!(text, "Hello");
    assert_eq!(usage.map(|u| u.total_tokens), Some(6));
}

mod failures {
    use super::*;

    const ERROR_MID_STREAM: &str =
        "{\"response\":\"a\",\"done\":false}\n{\"error\":\"out of memory\"}\n{\"response\":\"b\",\"done\":true}\n";

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn error_frame_is_delivered_then_raised() {
        let _guard = PolicyGuard::exceptions(true);
        let server = MockServer::start().await;
        mount_generate(&server, ERROR_MID_STREAM).await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let uri = server.uri();
        let err = blocking(move || {
            client(&uri).generate_stream(Request::generate("m", "hi"), move |frame: Response| {
                sink_seen.lock().expect("lock").push(frame.has_error());
                StreamControl::Continue
            })
        })
        .await
        .expect_err("error frame aborts the stream");

        assert!(matches!(err, Error::Server(ref m) if m == "out of memory"));
        assert_eq!(*seen.lock().expect("lock"), [false, true]);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn error_frame_returns_false_when_exceptions_off() {
        let _guard = PolicyGuard::exceptions(false);
        let server = MockServer::start().await;
        mount_generate(&server, ERROR_MID_STREAM).await;

        let uri = server.uri();
        let finished = blocking(move || {
            client(&uri).generate_stream(Request::generate("m", "hi"), |_: Response| {
                StreamControl::Continue
            })
        })
        .await
        .expect("no error escapes");

        assert!(!finished);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn truncated_stream_is_invalid_json() {
        let _guard = PolicyGuard::exceptions(true);
        let server = MockServer::start().await;
        mount_generate(&server, "{\"response\":\"a\",\"done\":false}\n{\"respo").await;

        let uri = server.uri();
        let err = blocking(move || {
            client(&uri).generate_stream(Request::generate("m", "hi"), |_: Response| {
                StreamControl::Continue
            })
        })
        .await
        .expect_err("residue is rejected");

        assert!(matches!(err, Error::InvalidJson { ref payload, .. } if payload == "{\"respo"));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn status_error_before_streaming() {
        let _guard = PolicyGuard::exceptions(true);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = blocking(move || {
            client(&uri).generate_stream(Request::generate("ghost", "hi"), |_: Response| {
                StreamControl::Continue
            })
        })
        .await
        .expect_err("404 is raised");

        assert!(err.is_not_found());
    }
}
