//! Gemini chat client using the genai crate.

use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};

use crate::config::ExtractorSettings;

/// Default Gemini chat model.
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("API key not set in environment variable {0}")]
    MissingCredential(String),
    #[error("Chat request failed: {0}")]
    Request(String),
    #[error("Chat response contained no text")]
    EmptyResponse,
}

/// A text-generation capability: system instructions plus one user message in,
/// text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError>;
}

/// Chat model implementation using Google's Gemini API via the `genai` crate.
///
/// The API key is read from the configured environment variable on every
/// request, so a missing key is reported when the model is first used rather
/// than at startup.
#[derive(Clone)]
pub struct GeminiChat {
    client: Client,
    model: String,
    api_key_env: String,
    options: ChatOptions,
}

impl GeminiChat {
    pub fn new(settings: &ExtractorSettings) -> Self {
        let env_name = settings.api_key_env.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_env(env_name.clone())))
            },
        );
        let client = Client::builder().with_auth_resolver(auth_resolver).build();
        let options = ChatOptions::default().with_temperature(0.0);

        Self {
            client,
            model: settings.model.clone(),
            api_key_env: settings.api_key_env.clone(),
            options,
        }
    }

    fn check_credential(&self) -> Result<(), ChatError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ChatError::MissingCredential(self.api_key_env.clone())),
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
        self.check_credential()?;

        let request = ChatRequest::new(vec![ChatMessage::user(user)]).with_system(system);
        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| ChatError::Request(e.to_string()))?;

        response
            .first_text()
            .map(str::to_owned)
            .ok_or(ChatError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_on_first_use() {
        let settings = ExtractorSettings {
            model: GEMINI_MODEL.to_string(),
            api_key_env: "PAPERS_TEST_UNSET_GEMINI_KEY".to_string(),
            timeout_secs: 1,
        };
        let chat = GeminiChat::new(&settings);

        let err = chat.complete("system", "query").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingCredential(name) if name == "PAPERS_TEST_UNSET_GEMINI_KEY"));
    }
}
