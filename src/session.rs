use crate::store::{LAST_CHAT_KEY, SharedStore, StoreResult, load_json, save_json};
use crate::types::{ChatId, Conversation, Message};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is still pending")]
    AlreadySending,

    #[error("no saved chat at index {index} (have {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("no saved chat with id {0}")]
    UnknownChat(ChatId),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The conversation currently being composed.
///
/// Every mutation writes the full sequence to the store under `lastChat`
/// before returning.
pub struct ActiveSession {
    store: SharedStore,
    conversation: Conversation,
}

impl ActiveSession {
    /// Resume the `lastChat` snapshot from `store`, or start empty.
    pub fn load(store: SharedStore) -> Self {
        let conversation: Conversation =
            load_json(store.as_ref(), LAST_CHAT_KEY).unwrap_or_default();
        tracing::debug!(messages = conversation.len(), "restored last chat");
        Self {
            store,
            conversation,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn append_user(&mut self, text: &str) -> SessionResult<()> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.conversation.push(Message::user(text));
        self.checkpoint();
        Ok(())
    }

    pub fn append_system(&mut self, text: &str) {
        self.conversation.push(Message::system(text));
        self.checkpoint();
    }

    /// Clear the session, handing back what it held.
    pub fn reset(&mut self) -> Conversation {
        if self.conversation.is_empty() {
            return Conversation::new();
        }
        let previous = std::mem::take(&mut self.conversation);
        self.checkpoint();
        previous
    }

    pub fn restore(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        self.checkpoint();
    }

    pub fn persist(&self) -> StoreResult<()> {
        save_json(self.store.as_ref(), LAST_CHAT_KEY, &self.conversation)
    }

    /// Final write on shutdown. Failures are dropped; there is nobody left to tell.
    pub fn save_on_exit(&self) {
        if let Err(err) = self.persist() {
            tracing::debug!(error = %err, "exit save failed");
        }
    }

    fn checkpoint(&self) {
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist last chat");
        }
    }
}
