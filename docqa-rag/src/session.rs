//! Per-user session state: the active document and the chat history.
//!
//! A [`SessionState`] is created empty, receives an [`ActiveDocument`] on
//! every successful build, and replaces the previous one wholesale. The swap
//! exchanges a single `Arc`, so a question running concurrently with a
//! rebuild sees either the old index or the new one, never a mix.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::answer::{AnswerComposer, RagAnswer};
use crate::error::{RagError, Result};
use crate::retriever::{Retriever, retrieve_docs};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the chat history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// An indexed document together with the retriever bound to it.
#[derive(Debug, Clone)]
pub struct ActiveDocument {
    name: String,
    retriever: Retriever,
}

impl ActiveDocument {
    pub fn new(name: impl Into<String>, retriever: Retriever) -> Self {
        Self { name: name.into(), retriever }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.retriever.index().len()
    }
}

/// State for one user context.
#[derive(Debug, Default)]
pub struct SessionState {
    active: RwLock<Option<Arc<ActiveDocument>>>,
    history: RwLock<Vec<ChatMessage>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `document`, replacing any previous one. Chat history is kept.
    pub async fn activate(&self, document: ActiveDocument) {
        let document = Arc::new(document);
        let previous = self.active.write().await.replace(Arc::clone(&document));
        info!(
            document = document.name(),
            chunk_count = document.chunk_count(),
            replaced = previous.as_ref().map(|d| d.name()),
            "activated document"
        );
    }

    /// The document currently being asked about, if any.
    pub async fn active_document(&self) -> Option<Arc<ActiveDocument>> {
        self.active.read().await.clone()
    }

    pub async fn document_name(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|d| d.name().to_string())
    }

    /// Answer `question` against the active document and record the exchange.
    ///
    /// An empty question is answered by the composer without a search and
    /// only the composer's reply is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoActiveDocument`] if nothing has been indexed, or
    /// the retrieval error. History is unchanged on error.
    pub async fn ask(&self, question: &str, composer: &dyn AnswerComposer) -> Result<RagAnswer> {
        if question.trim().is_empty() {
            let answer = composer.compose(question, Vec::new());
            self.history.write().await.push(ChatMessage::assistant(answer.answer.clone()));
            return Ok(answer);
        }

        let document = self.active_document().await.ok_or(RagError::NoActiveDocument)?;
        let retrieved = retrieve_docs(document.retriever(), question).await?;
        let answer = composer.compose(question, retrieved.into_results());

        let mut history = self.history.write().await;
        history.push(ChatMessage::user(question));
        history.push(ChatMessage::assistant(answer.answer.clone()));
        Ok(answer)
    }

    /// A snapshot of the chat history, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.read().await.clone()
    }

    /// Forget the chat history but keep the active document.
    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    /// Drop the active document and the chat history.
    pub async fn clear(&self) {
        *self.active.write().await = None;
        self.history.write().await.clear();
        info!("session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let json = serde_json::to_string(&ChatMessage::assistant("hello")).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[tokio::test]
    async fn new_session_is_empty() {
        let session = SessionState::new();
        assert!(session.active_document().await.is_none());
        assert!(session.document_name().await.is_none());
        assert!(session.history().await.is_empty());
    }
}
