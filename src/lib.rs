//! Kestrel - a chat client that keeps its conversations
//!
//! The core is UI-independent: an active session, an archive of saved chats,
//! a durable key-value store behind both, and a controller that runs one
//! request/response turn at a time against a remote completion backend.
//! The Dioxus front end lives behind the `web`, `desktop` and `mobile` features.

pub mod archive;
pub mod completion;
pub mod config;
pub mod controller;
pub mod render;
pub mod session;
pub mod store;
pub mod types;

#[cfg(feature = "dioxus")]
pub mod ui;
#[cfg(feature = "dioxus")]
pub mod views;

pub use archive::{ConversationArchive, summarize};
pub use completion::{CompletionBackend, CompletionError, CompletionResult, SharedBackend};
pub use config::Settings;
pub use controller::{PendingTurn, SessionController, TurnOutcome, TurnReply, TurnState};
pub use session::{ActiveSession, SessionError, SessionResult};
pub use store::{DurableStore, FileStore, MemoryStore, SharedStore, StoreError};
pub use types::{ChatId, Conversation, Message, SavedChat, Sender};
