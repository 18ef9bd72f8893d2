//! Loading/error tracking around AI calls.
//!
//! [`AiRequestHook`] owns a single `{is_loading, error}` pair. Every call
//! resets it on entry and updates it when it settles. Calls are not queued
//! or de-duplicated: clones of a hook share the same state, and when calls
//! overlap, whichever settles last decides what is observed.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{AiError, MessageSender};
use crate::core::question::{plan_prompt, Question};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    pub is_loading: bool,
    pub error: Option<AiError>,
}

type Callback = Arc<dyn Fn() + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&AiError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct HookOptions {
    on_start: Option<Callback>,
    on_complete: Option<Callback>,
    on_error: Option<ErrorCallback>,
}

impl HookOptions {
    /// Called once loading has been set, before the message is sent.
    pub fn on_start(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(callback));
        self
    }

    /// Called after a successful call, before loading is cleared.
    pub fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Called with every failure, before the failure is returned.
    pub fn on_error(mut self, callback: impl Fn(&AiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

pub struct AiRequestHook<S> {
    sender: Arc<S>,
    state: Arc<watch::Sender<RequestState>>,
    options: HookOptions,
}

impl<S> Clone for AiRequestHook<S> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            state: Arc::clone(&self.state),
            options: self.options.clone(),
        }
    }
}

impl<S: MessageSender> AiRequestHook<S> {
    pub fn new(sender: S) -> Self {
        Self::with_options(sender, HookOptions::default())
    }

    pub fn with_options(sender: S, options: HookOptions) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            sender: Arc::new(sender),
            state: Arc::new(state),
            options,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<AiError> {
        self.state.borrow().error.clone()
    }

    /// Receives every state transition, for rendering loading indicators.
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub async fn ask_ai(&self, question: impl Into<Question>) -> Result<Value, AiError> {
        self.begin();
        let message = question.into().into_message();
        debug!(chars = message.len(), "asking assistant");
        let result = self.sender.send_message(&message).await;
        self.settle(result)
    }

    /// Asks for a plan built from `preferences` and `user_data`.
    pub async fn generate_plan<P: Serialize + ?Sized>(
        &self,
        preferences: &P,
        user_data: &Value,
    ) -> Result<Value, AiError> {
        self.begin();
        let result = match plan_prompt(preferences, user_data) {
            Ok(message) => {
                debug!(chars = message.len(), "requesting fitness plan");
                self.sender.send_message(&message).await
            }
            Err(err) => Err(err),
        };
        self.settle(result)
    }

    fn begin(&self) {
        self.state.send_replace(RequestState {
            is_loading: true,
            error: None,
        });
        if let Some(callback) = &self.options.on_start {
            callback();
        }
    }

    fn settle(&self, result: Result<Value, AiError>) -> Result<Value, AiError> {
        match result {
            Ok(value) => {
                if let Some(callback) = &self.options.on_complete {
                    callback();
                }
                self.state.send_modify(|state| state.is_loading = false);
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "assistant call failed");
                self.state.send_replace(RequestState {
                    is_loading: false,
                    error: Some(err.clone()),
                });
                if let Some(callback) = &self.options.on_error {
                    callback(&err);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, oneshot};

    use crate::core::question::PlanPreferences;

    /// Answers from a script and records every message it was given.
    #[derive(Default)]
    struct ScriptedSender {
        replies: Mutex<VecDeque<Result<Value, AiError>>>,
        received: Mutex<Vec<String>>,
    }

    impl ScriptedSender {
        fn replying(replies: Vec<Result<Value, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                received: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send_message(&self, message: &str) -> Result<Value, AiError> {
            self.received.lock().unwrap().push(message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Value::Null))
        }
    }

    /// Holds each call open until the test releases it.
    struct GatedSender {
        calls: mpsc::UnboundedSender<(String, oneshot::Sender<Result<Value, AiError>>)>,
    }

    #[async_trait]
    impl MessageSender for GatedSender {
        async fn send_message(&self, message: &str) -> Result<Value, AiError> {
            let (release, gate) = oneshot::channel();
            self.calls
                .send((message.to_string(), release))
                .map_err(|_| AiError::new("test harness dropped"))?;
            gate.await
                .unwrap_or_else(|_| Err(AiError::new("gate dropped")))
        }
    }

    fn gated() -> (
        AiRequestHook<GatedSender>,
        mpsc::UnboundedReceiver<(String, oneshot::Sender<Result<Value, AiError>>)>,
    ) {
        let (calls, rx) = mpsc::unbounded_channel();
        (AiRequestHook::new(GatedSender { calls }), rx)
    }

    #[tokio::test]
    async fn ask_ai_sends_text_verbatim_and_returns_result() {
        let hook = AiRequestHook::new(ScriptedSender::replying(vec![Ok(
            json!({"data": {"response": "Try intervals."}}),
        )]));

        let value = hook.ask_ai("How do I get faster?").await.unwrap();

        assert_eq!(value, json!({"data": {"response": "Try intervals."}}));
        assert_eq!(
            *hook.sender.received.lock().unwrap(),
            vec!["How do I get faster?".to_string()]
        );
        assert_eq!(hook.state(), RequestState::default());
    }

    #[tokio::test]
    async fn ask_ai_serializes_structured_questions() {
        let hook = AiRequestHook::new(ScriptedSender::default());

        hook.ask_ai(json!({"question": "protein?", "weightKg": 70}))
            .await
            .unwrap();

        assert_eq!(
            *hook.sender.received.lock().unwrap(),
            vec![r#"{"question":"protein?","weightKg":70}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn generate_plan_sends_prompt_with_serialized_inputs() {
        let hook = AiRequestHook::new(ScriptedSender::default());
        let preferences = PlanPreferences {
            focus_area: "strength".to_string(),
            duration: "4 weeks".to_string(),
            days_per_week: 3,
        };

        hook.generate_plan(&preferences, &json!({})).await.unwrap();

        let received = hook.sender.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0]
            .contains(r#"{"focusArea":"strength","duration":"4 weeks","daysPerWeek":3}"#));
        assert!(received[0].contains("User data: {}"));
    }

    #[tokio::test]
    async fn failure_is_recorded_reported_and_returned() {
        let failure = AiError::from_response(500, r#"{"detail":"Chat request failed"}"#);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_callback = Arc::clone(&seen);
        let hook = AiRequestHook::with_options(
            ScriptedSender::replying(vec![Err(failure.clone())]),
            HookOptions::default().on_error(move |err| {
                seen_by_callback.lock().unwrap().push(err.clone());
            }),
        );

        let err = hook.ask_ai("plan my rest day").await.unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(hook.error(), Some(failure.clone()));
        assert!(!hook.is_loading());
        assert_eq!(*seen.lock().unwrap(), vec![failure]);
    }

    #[tokio::test]
    async fn plan_failure_is_recorded_reported_and_returned() {
        let failure = AiError::from_response(429, r#"{"detail":"Rate limit exceeded"}"#);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_callback = Arc::clone(&seen);
        let hook = AiRequestHook::with_options(
            ScriptedSender::replying(vec![Err(failure.clone())]),
            HookOptions::default().on_error(move |err| {
                seen_by_callback.lock().unwrap().push(err.clone());
            }),
        );
        let preferences = PlanPreferences {
            focus_area: "flexibility".to_string(),
            duration: "6 weeks".to_string(),
            days_per_week: 4,
        };

        let err = hook
            .generate_plan(&preferences, &json!({"age": 52}))
            .await
            .unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(
            hook.state(),
            RequestState {
                is_loading: false,
                error: Some(failure.clone()),
            }
        );
        assert_eq!(*seen.lock().unwrap(), vec![failure]);
        assert_eq!(hook.sender.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_callbacks_run_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let options = HookOptions::default()
            .on_start({
                let events = Arc::clone(&events);
                move || events.lock().unwrap().push("start".to_string())
            })
            .on_complete({
                let events = Arc::clone(&events);
                move || events.lock().unwrap().push("complete".to_string())
            })
            .on_error({
                let events = Arc::clone(&events);
                move |err| events.lock().unwrap().push(format!("error: {}", err.message()))
            });
        let hook = AiRequestHook::with_options(
            ScriptedSender::replying(vec![Ok(json!("fine")), Err(AiError::new("offline"))]),
            options,
        );

        hook.ask_ai("first").await.unwrap();
        hook.generate_plan(&json!({}), &json!({})).await.unwrap_err();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["start", "complete", "start", "error: offline"]
        );
    }

    #[tokio::test]
    async fn new_call_clears_previous_error() {
        let hook = AiRequestHook::new(ScriptedSender::replying(vec![
            Err(AiError::new("offline")),
            Ok(json!("fine")),
        ]));

        hook.ask_ai("first").await.unwrap_err();
        assert!(hook.error().is_some());

        hook.ask_ai("second").await.unwrap();
        assert_eq!(hook.state(), RequestState::default());
    }

    #[tokio::test]
    async fn loading_is_true_while_call_is_in_flight() {
        let (hook, mut calls) = gated();
        let mut states = hook.subscribe();

        let task = tokio::spawn({
            let hook = hook.clone();
            async move { hook.ask_ai("in flight?").await }
        });

        let (message, release) = calls.recv().await.expect("sender should be called");
        assert_eq!(message, "in flight?");
        assert!(hook.is_loading());
        assert!(states.borrow_and_update().is_loading);

        release.send(Err(AiError::new("boom"))).unwrap();
        let result = task.await.unwrap();

        assert_eq!(result, Err(AiError::new("boom")));
        assert!(!hook.is_loading());
        assert_eq!(hook.error(), Some(AiError::new("boom")));
        assert!(states.has_changed().unwrap());
    }

    #[tokio::test]
    async fn overlapping_calls_leave_last_settled_state() {
        let (hook, mut calls) = gated();

        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.ask_ai("first").await }
        });
        let (_, release_first) = calls.recv().await.unwrap();

        let second = tokio::spawn({
            let hook = hook.clone();
            async move { hook.ask_ai("second").await }
        });
        let (_, release_second) = calls.recv().await.unwrap();

        release_second.send(Err(AiError::new("second failed"))).unwrap();
        second.await.unwrap().unwrap_err();

        // The first call is still in flight, but its flags were clobbered.
        assert!(!hook.is_loading());
        assert_eq!(hook.error(), Some(AiError::new("second failed")));

        release_first.send(Err(AiError::new("first failed"))).unwrap();
        first.await.unwrap().unwrap_err();

        assert_eq!(
            hook.state(),
            RequestState {
                is_loading: false,
                error: Some(AiError::new("first failed")),
            }
        );
    }

    #[tokio::test]
    async fn later_success_does_not_clear_an_overlapping_failure() {
        let (hook, mut calls) = gated();

        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.ask_ai("first").await }
        });
        let (_, release_first) = calls.recv().await.unwrap();
        let second = tokio::spawn({
            let hook = hook.clone();
            async move { hook.ask_ai("second").await }
        });
        let (_, release_second) = calls.recv().await.unwrap();

        release_first.send(Err(AiError::new("first failed"))).unwrap();
        first.await.unwrap().unwrap_err();
        release_second.send(Ok(json!({"ok": true}))).unwrap();
        second.await.unwrap().unwrap();

        assert!(!hook.is_loading());
        assert_eq!(hook.error(), Some(AiError::new("first failed")));
    }
}
