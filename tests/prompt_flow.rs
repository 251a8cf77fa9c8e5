use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

use hookprompt::domains::history::ResponsePayload;
use hookprompt::render::render_history;
use hookprompt::services::prompt_input::{EMPTY_PROMPT, MISSING_WEBHOOK, SEND_SUCCESS};
use hookprompt::services::{PromptInput, Session};
use hookprompt::storage::{MemoryStorage, Storage, HISTORY_KEY, WEBHOOK_URL_KEY};
use hookprompt::webhook::WebhookClient;
use hookprompt::HookPromptError;

fn session_for(url: Option<&str>) -> (Arc<MemoryStorage>, Session) {
    let storage = Arc::new(MemoryStorage::new());
    if let Some(url) = url {
        storage.set(WEBHOOK_URL_KEY, url).unwrap();
    }
    let session = Session::load(storage.clone()).unwrap();
    (storage, session)
}

#[tokio::test]
async fn successful_reply_is_recorded_and_rendered() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/webhook/prompt")
                .header("content-type", "application/json")
                .json_body(json!({"prompt": "hello"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"message": "hi"}));
        })
        .await;

    let (storage, mut session) = session_for(Some(&server.url("/webhook/prompt")));
    let input = PromptInput::new(WebhookClient::new());

    let submission = session.send_prompt(&input, "hello").await.unwrap();
    assert!(submission.succeeded());
    assert_eq!(submission.notice.message, SEND_SUCCESS);

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history.items()[0].prompt, "hello");
    assert_eq!(
        history.items()[0].response,
        Some(ResponsePayload::Structured(json!({"message": "hi"})))
    );
    assert_eq!(render_history(history)[0].response.as_deref(), Some("hi"));
    assert!(storage.get(HISTORY_KEY).unwrap().is_some());
    hook.assert_calls(1);
}

#[tokio::test]
async fn server_error_records_entry_without_payload() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(500).body("Internal Error");
        })
        .await;

    let (_, mut session) = session_for(Some(&server.url("/hook")));
    let input = PromptInput::new(WebhookClient::new());

    let submission = session.send_prompt(&input, "hello").await.unwrap();
    assert!(!submission.succeeded());
    assert_eq!(
        submission.notice.message,
        "Failed to send prompt: 500 Internal Server Error"
    );
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().items()[0].prompt, "hello");
    assert_eq!(session.history().items()[0].response, None);
    hook.assert_calls(1);
}

#[tokio::test]
async fn missing_webhook_sends_nothing_and_records_nothing() {
    let (storage, mut session) = session_for(None);
    let input = PromptInput::new(WebhookClient::new());

    let err = session.send_prompt(&input, "test").await.unwrap_err();
    assert!(matches!(err, HookPromptError::Validation(_)));
    assert_eq!(err.user_message(), MISSING_WEBHOOK);
    assert!(session.history().is_empty());
    assert_eq!(storage.get(HISTORY_KEY).unwrap(), None);
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_webhook() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(200);
        })
        .await;

    let (_, mut session) = session_for(Some(&server.url("/hook")));
    let input = PromptInput::new(WebhookClient::new());

    for prompt in ["", "  ", "\n"] {
        let err = session.send_prompt(&input, prompt).await.unwrap_err();
        assert_eq!(err.user_message(), EMPTY_PROMPT);
    }
    assert!(session.history().is_empty());
    hook.assert_calls(0);
}

#[tokio::test]
async fn body_is_trimmed_but_history_keeps_the_typed_prompt() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/hook")
                .json_body(json!({"prompt": "summarize this"}));
            then.status(200).json_body(json!({"text": "done"}));
        })
        .await;

    let (_, mut session) = session_for(Some(&server.url("/hook")));
    let input = PromptInput::new(WebhookClient::new());

    session
        .send_prompt(&input, "  summarize this\n")
        .await
        .unwrap();
    assert_eq!(session.history().items()[0].prompt, "  summarize this\n");
    hook.assert_calls(1);
}

#[tokio::test]
async fn non_json_success_falls_back_to_status_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(200).body("Workflow was started");
        })
        .await;

    let (_, mut session) = session_for(Some(&server.url("/hook")));
    let input = PromptInput::new(WebhookClient::new());

    let submission = session.send_prompt(&input, "go").await.unwrap();
    assert!(submission.succeeded());
    assert_eq!(
        submission.response,
        Some(ResponsePayload::Structured(json!({"message": "OK"})))
    );
    assert_eq!(
        render_history(session.history())[0].response.as_deref(),
        Some("OK")
    );
}

#[tokio::test]
async fn unreachable_host_is_recorded_as_failed() {
    let (_, mut session) = session_for(Some("http://127.0.0.1:1/hook"));
    let input = PromptInput::new(WebhookClient::new());

    let submission = session.send_prompt(&input, "hello").await.unwrap();
    assert!(!submission.succeeded());
    assert!(submission.notice.message.starts_with("Failed to send prompt: "));
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().items()[0].response, None);
    assert!(!input.is_sending());
}

#[tokio::test]
async fn second_submission_is_refused_while_one_is_in_flight() {
    let server = MockServer::start_async().await;
    let hook = server
        .mock_async(|when, then| {
            when.method(POST).path("/slow");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(json!({"message": "late"}));
        })
        .await;

    let url = server.url("/slow");
    let input = PromptInput::new(WebhookClient::new());

    let (first, second) = tokio::join!(input.submit("one", &url), input.submit("two", &url));
    assert!(first.unwrap().succeeded());
    assert!(matches!(second.unwrap_err(), HookPromptError::Busy(_)));
    assert!(!input.is_sending());
    hook.assert_calls(1);
}

#[tokio::test]
async fn eleven_submissions_keep_the_latest_ten() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/hook");
            then.status(200).json_body(json!({"message": "ok"}));
        })
        .await;

    let (storage, mut session) = session_for(Some(&server.url("/hook")));
    let input = PromptInput::new(WebhookClient::new());
    for n in 1..=11 {
        session
            .send_prompt(&input, &format!("prompt {n}"))
            .await
            .unwrap();
    }

    let prompts: Vec<String> = session
        .history()
        .iter()
        .map(|item| item.prompt.clone())
        .collect();
    let expected: Vec<String> = (2..=11).rev().map(|n| format!("prompt {n}")).collect();
    assert_eq!(prompts, expected);

    let reloaded = Session::load(storage).unwrap();
    assert_eq!(reloaded.history(), session.history());
}
