//! Scripted chat model for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::chat::{ChatError, ChatModel};

/// Chat model that replays scripted replies and counts calls.
///
/// # Examples
///
/// ```ignore
/// let model = MockChatModel::replying(r#"["Finite Automata"]"#);
/// let model = MockChatModel::failing(ChatError::Request("connection reset".into()));
/// ```
#[derive(Clone)]
pub struct MockChatModel {
    replies: Arc<Vec<Result<String, ChatError>>>,
    call_count: Arc<AtomicUsize>,
    delay: Option<Duration>,
    last_prompt: Arc<Mutex<Option<(String, String)>>>,
}

#[allow(dead_code)]
impl MockChatModel {
    /// Always answer with `reply`.
    pub fn replying(reply: &str) -> Self {
        Self::with_sequence(vec![Ok(reply.to_string())])
    }

    /// Always fail with `error`.
    pub fn failing(error: ChatError) -> Self {
        Self::with_sequence(vec![Err(error)])
    }

    /// Replay `replies` in order, wrapping around.
    pub fn with_sequence(replies: Vec<Result<String, ChatError>>) -> Self {
        Self {
            replies: Arc::new(replies),
            call_count: Arc::new(AtomicUsize::new(0)),
            delay: None,
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Sleep before every reply.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// System and user message of the most recent call.
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some((system.to_string(), user.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.replies[idx % self.replies.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_sequence_and_counts() {
        let model = MockChatModel::with_sequence(vec![
            Ok("[\"a\"]".to_string()),
            Err(ChatError::EmptyResponse),
        ]);

        assert_eq!(model.complete("s", "u").await.unwrap(), "[\"a\"]");
        assert!(model.complete("s", "u").await.is_err());
        assert_eq!(model.complete("s", "u").await.unwrap(), "[\"a\"]");
        assert_eq!(model.call_count(), 3);
        assert_eq!(model.last_prompt(), Some(("s".to_string(), "u".to_string())));
    }
}
