//! Category extraction backed by a chat model.

mod chat;
mod classifier;
#[cfg(test)]
mod mock;

pub use chat::{ChatError, ChatModel, GeminiChat, GEMINI_MODEL};
pub use classifier::{GeminiCategoryExtractor, ModelCategoryExtractor};
#[cfg(test)]
pub use mock::MockChatModel;
