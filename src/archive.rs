use crate::session::{SessionError, SessionResult};
use crate::store::{SAVED_CHATS_KEY, SharedStore, load_json, save_json};
use crate::types::{ChatId, Conversation, SavedChat};

/// Longest summary taken from a conversation's first user message.
pub const SUMMARY_MAX_CHARS: usize = 30;
pub const SUMMARY_ELLIPSIS: &str = "...";

/// Finished (or abandoned) conversations, oldest first, mirrored to the store
/// under `savedChats` after every change.
pub struct ConversationArchive {
    store: SharedStore,
    chats: Vec<SavedChat>,
}

impl ConversationArchive {
    /// Load the archive persisted in `store`. Empty conversations are dropped.
    pub fn load(store: SharedStore) -> Self {
        let saved: Vec<Conversation> = load_json(store.as_ref(), SAVED_CHATS_KEY).unwrap_or_default();
        let chats: Vec<SavedChat> = saved
            .into_iter()
            .filter(|conversation| !conversation.is_empty())
            .map(|conversation| SavedChat {
                id: ChatId::generate(),
                conversation,
            })
            .collect();
        tracing::debug!(count = chats.len(), "loaded saved chats");
        Self { store, chats }
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedChat> {
        self.chats.iter()
    }

    /// Add `conversation` at the end and persist. Empty conversations are refused
    /// and yield `None`.
    pub fn append(&mut self, conversation: Conversation) -> Option<ChatId> {
        if conversation.is_empty() {
            return None;
        }
        let id = ChatId::generate();
        self.chats.push(SavedChat { id, conversation });
        self.persist();
        Some(id)
    }

    /// Remove the entry at `index`; out-of-range indices are ignored.
    pub fn delete_at(&mut self, index: usize) -> Option<SavedChat> {
        if index >= self.chats.len() {
            tracing::debug!(index, len = self.chats.len(), "delete ignored, index out of range");
            return None;
        }
        let removed = self.chats.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn delete_by_id(&mut self, id: ChatId) -> Option<SavedChat> {
        let index = self.position(id)?;
        self.delete_at(index)
    }

    pub fn get(&self, index: usize) -> SessionResult<&Conversation> {
        self.chats
            .get(index)
            .map(|chat| &chat.conversation)
            .ok_or(SessionError::OutOfRange {
                index,
                len: self.chats.len(),
            })
    }

    pub fn get_by_id(&self, id: ChatId) -> Option<&Conversation> {
        self.chats
            .iter()
            .find(|chat| chat.id == id)
            .map(|chat| &chat.conversation)
    }

    /// Current index of the chat with `id`.
    pub fn position(&self, id: ChatId) -> Option<usize> {
        self.chats.iter().position(|chat| chat.id == id)
    }

    pub fn id_at(&self, index: usize) -> Option<ChatId> {
        self.chats.get(index).map(|chat| chat.id)
    }

    /// Sidebar label for the entry at `index`.
    pub fn summarize(&self, index: usize) -> SessionResult<String> {
        self.get(index)
            .map(|conversation| summarize(conversation, index))
    }

    fn persist(&self) {
        let conversations: Vec<&Conversation> =
            self.chats.iter().map(|chat| &chat.conversation).collect();
        if let Err(err) = save_json(self.store.as_ref(), SAVED_CHATS_KEY, &conversations) {
            tracing::warn!(error = %err, "failed to persist saved chats");
        }
    }
}

/// First user message, cut to `SUMMARY_MAX_CHARS` characters with an ellipsis
/// when longer. Conversations without a user message are labelled by position.
pub fn summarize(conversation: &Conversation, position: usize) -> String {
    let Some(first) = conversation.first_user_message() else {
        return format!("Chat {}", position + 1);
    };

    let text = first.text();
    if text.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{head}{SUMMARY_ELLIPSIS}")
    } else {
        text.to_string()
    }
}
