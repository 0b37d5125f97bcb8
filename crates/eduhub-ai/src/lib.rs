//! AI-assisted learning mini-apps: tutor chat, voice summarizer, story
//! generator, quiz battles and performance reviews.
//!
//! Each generator asks the chat-completion endpoint once. Any failure is
//! logged and degrades to deterministic placeholder content flagged with
//! `fallback = true`; nothing here returns an error to the caller.

pub mod client;
pub mod error;
pub mod quiz;
pub mod review;
pub mod story;
pub mod summary;
pub mod tutor;

pub use client::{
    AiConfig, ChatBackend, CompletionRequest, OpenAiClient, UnconfiguredBackend,
    backend_from_config,
};
pub use error::{AiError, AiResult};

use eduhub_types::api::{ChatRole, ChatTurn};

/// Message shown to the user when a mini-app served offline content.
pub fn fallback_notice(feature: &str) -> String {
    format!("The {} is unavailable right now, showing offline content instead.", feature)
}

pub(crate) fn system(content: impl Into<String>) -> ChatTurn {
    ChatTurn { role: ChatRole::System, content: content.into() }
}

pub(crate) fn user(content: impl Into<String>) -> ChatTurn {
    ChatTurn { role: ChatRole::User, content: content.into() }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use futures_util::future::BoxFuture;

    use crate::client::{ChatBackend, CompletionRequest};
    use crate::error::{AiError, AiResult};

    /// Answers every request with the same text and records what it was asked.
    pub struct ScriptedBackend {
        reply: String,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(reply: impl Into<String>) -> Self {
            Self { reply: reply.into(), requests: Mutex::new(Vec::new()) }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn complete(&self, request: CompletionRequest) -> BoxFuture<'_, AiResult<String>> {
            self.requests.lock().unwrap().push(request);
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    pub struct FailingBackend;

    impl ChatBackend for FailingBackend {
        fn complete(&self, _request: CompletionRequest) -> BoxFuture<'_, AiResult<String>> {
            Box::pin(async { Err(AiError::Status { status: 503, body: "overloaded".into() }) })
        }
    }
}
