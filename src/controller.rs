use crate::archive::ConversationArchive;
use crate::completion::{CompletionResult, SharedBackend, backend_from_settings};
use crate::config::Settings;
use crate::session::{ActiveSession, SessionError, SessionResult};
use crate::store::{FileStore, SharedStore};
use crate::types::{ChatId, SavedChat};
use std::sync::{Arc, Weak};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    Sending,
}

/// How a turn ended. The stored system message looks the same in every case;
/// only its text differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied,
    EmptyReply,
    Failed,
    /// The reply belongs to a turn this controller is not waiting on; nothing
    /// was recorded.
    Discarded,
}

/// Marks one outstanding turn. The controller only keeps a weak handle, so a
/// turn whose pending/reply values are all dropped is visibly abandoned.
struct TurnToken;

/// A turn whose user message is already recorded and whose reply is still
/// owed. Holds everything needed to make the remote call, so the caller can
/// release the controller while waiting.
///
/// Dropping it (or the `resolve` future) without handing a reply to
/// `finish_turn` abandons the turn: the controller records the failure text
/// and goes back to `Idle` on its next mutation.
pub struct PendingTurn {
    prompt: String,
    backend: SharedBackend,
    token: Arc<TurnToken>,
}

impl PendingTurn {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub async fn resolve(self) -> TurnReply {
        let result = self.backend.complete(&self.prompt).await;
        self.settle(result)
    }

    /// Attach a result obtained without going through the backend.
    pub fn settle(self, result: CompletionResult<String>) -> TurnReply {
        TurnReply {
            result,
            token: self.token,
        }
    }
}

/// The backend's answer for one turn, ready for `finish_turn`.
pub struct TurnReply {
    result: CompletionResult<String>,
    token: Arc<TurnToken>,
}

/// Drives the active session and the archive in response to user actions.
///
/// Turn lifecycle:
///
/// ```text
/// Idle --begin_turn--> Sending --finish_turn--> Idle
///                        |
///                        +--turn dropped--> Idle (failure text recorded)
/// ```
///
/// `begin_turn` records the user message and clears the input before any I/O.
/// `finish_turn` appends exactly one system message and returns to `Idle`. A
/// second `begin_turn` while `Sending` is rejected untouched.
pub struct SessionController {
    session: ActiveSession,
    archive: ConversationArchive,
    backend: SharedBackend,
    in_flight: Option<Weak<TurnToken>>,
    failure_text: String,
    empty_reply_text: String,
}

impl SessionController {
    pub fn new(store: SharedStore, backend: SharedBackend, settings: &Settings) -> Self {
        Self {
            session: ActiveSession::load(Arc::clone(&store)),
            archive: ConversationArchive::load(store),
            backend,
            in_flight: None,
            failure_text: settings.failure_text.clone(),
            empty_reply_text: settings.empty_reply_text.clone(),
        }
    }

    /// File-backed controller using the backend selected by `settings`.
    pub fn open(settings: &Settings) -> Self {
        let store: SharedStore = Arc::new(FileStore::new(settings.data_dir.clone()));
        tracing::info!(dir = %settings.data_dir.display(), "opening chat store");
        Self::new(store, backend_from_settings(settings), settings)
    }

    pub fn session(&self) -> &ActiveSession {
        &self.session
    }

    pub fn archive(&self) -> &ConversationArchive {
        &self.archive
    }

    /// `Sending` while some `PendingTurn` or `TurnReply` for the current turn
    /// is still alive.
    pub fn state(&self) -> TurnState {
        match &self.in_flight {
            Some(token) if token.strong_count() > 0 => TurnState::Sending,
            _ => TurnState::Idle,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.state() == TurnState::Sending
    }

    /// Start a turn with the contents of `input`.
    ///
    /// On success the user message is stored, `input` is emptied and the
    /// controller is `Sending`. On error nothing changes, `input` included.
    pub fn begin_turn(&mut self, input: &mut String) -> SessionResult<PendingTurn> {
        self.reap_abandoned();
        if self.is_sending() {
            return Err(SessionError::AlreadySending);
        }
        self.session.append_user(input)?;

        let prompt = std::mem::take(input);
        let token = Arc::new(TurnToken);
        self.in_flight = Some(Arc::downgrade(&token));
        tracing::debug!(chars = prompt.chars().count(), "turn started");
        Ok(PendingTurn {
            prompt,
            backend: Arc::clone(&self.backend),
            token,
        })
    }

    /// Record the reply for the outstanding turn and return to `Idle`.
    ///
    /// The system message goes to whichever conversation is active when the
    /// reply lands. The UI keeps new/load disabled while `Sending` so that is
    /// the conversation the turn started in.
    pub fn finish_turn(&mut self, reply: TurnReply) -> TurnOutcome {
        let current = self.in_flight.as_ref().and_then(Weak::upgrade);
        if !current.is_some_and(|token| Arc::ptr_eq(&token, &reply.token)) {
            tracing::warn!("reply arrived for a turn that is no longer outstanding");
            return TurnOutcome::Discarded;
        }
        self.in_flight = None;

        let outcome = match reply.result {
            Ok(text) if text.is_empty() => {
                self.session.append_system(&self.empty_reply_text);
                TurnOutcome::EmptyReply
            }
            Ok(text) => {
                self.session.append_system(&text);
                TurnOutcome::Replied
            }
            Err(err) => {
                tracing::warn!(error = %err, "completion failed");
                self.session.append_system(&self.failure_text);
                TurnOutcome::Failed
            }
        };
        tracing::debug!(?outcome, "turn finished");
        outcome
    }

    /// Run a whole turn: record, call the backend, record the reply.
    ///
    /// If this future is dropped or the backend panics, the turn is closed
    /// with the failure text before control leaves the controller.
    pub async fn submit(&mut self, input: &mut String) -> SessionResult<TurnOutcome> {
        let turn = self.begin_turn(input)?;
        let guard = TurnGuard {
            controller: Some(self),
        };
        let reply = turn.resolve().await;
        Ok(guard.finish(reply))
    }

    /// Archive the active conversation if it has messages, then clear it.
    ///
    /// The archive is written before `lastChat` is emptied, so an interrupted
    /// switch leaves the conversation in at least one key.
    pub fn new_chat(&mut self) -> Option<ChatId> {
        self.reap_abandoned();
        if self.session.is_empty() {
            return None;
        }
        let id = self.archive.append(self.session.conversation().clone());
        self.session.reset();
        tracing::info!(saved = self.archive.len(), "started new chat");
        id
    }

    /// Replace the active conversation with a copy of the saved chat at `index`.
    ///
    /// The current conversation is not archived first; only `new_chat` does that.
    pub fn load_chat(&mut self, index: usize) -> SessionResult<()> {
        self.reap_abandoned();
        let conversation = self.archive.get(index)?.clone();
        self.session.restore(conversation);
        Ok(())
    }

    pub fn load_chat_by_id(&mut self, id: ChatId) -> SessionResult<()> {
        self.reap_abandoned();
        let conversation = self
            .archive
            .get_by_id(id)
            .ok_or(SessionError::UnknownChat(id))?
            .clone();
        self.session.restore(conversation);
        Ok(())
    }

    /// Delete the saved chat at `index`. The active conversation is untouched,
    /// even if it was loaded from that entry. Later indices shift down by one.
    pub fn delete_chat(&mut self, index: usize) -> Option<SavedChat> {
        self.archive.delete_at(index)
    }

    pub fn delete_chat_by_id(&mut self, id: ChatId) -> Option<SavedChat> {
        self.archive.delete_by_id(id)
    }

    /// Best-effort snapshot of the active conversation for shutdown paths.
    /// Synchronous, no network, never fails.
    pub fn save_on_exit(&self) {
        self.session.save_on_exit();
    }

    /// Close the outstanding turn with the failure text, if there is one.
    fn abandon_turn(&mut self) {
        if self.in_flight.take().is_some() {
            tracing::warn!("turn ended without a reply");
            self.session.append_system(&self.failure_text);
        }
    }

    fn reap_abandoned(&mut self) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|token| token.strong_count() == 0)
        {
            self.abandon_turn();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.reap_abandoned();
        self.save_on_exit();
    }
}

/// Holds the controller across the await in `submit`; closes the turn if the
/// future is dropped or unwinds before a reply is recorded.
struct TurnGuard<'a> {
    controller: Option<&'a mut SessionController>,
}

impl TurnGuard<'_> {
    fn finish(mut self, reply: TurnReply) -> TurnOutcome {
        match self.controller.take() {
            Some(controller) => controller.finish_turn(reply),
            None => TurnOutcome::Discarded,
        }
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.abandon_turn();
        }
    }
}
