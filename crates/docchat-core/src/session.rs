//! The chat session owned by whichever screen is showing the conversation.
//!
//! A session holds the transcript for one uploaded document. The transcript
//! only ever grows until [`ChatSession::reset`] throws the whole session away.
//! At most one question is in flight at a time; its answer is matched back to
//! it by request id so that an answer arriving after a reset is dropped.

use uuid::Uuid;

use crate::error::ClientError;
use crate::file::SelectedFile;
use crate::state::{ChatMode, Message, Role};

/// Shown in place of an answer for every kind of chat failure
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't get a response. Please try again.";

/// A question that has been recorded and is waiting for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub request_id: Uuid,
    pub question: String,
    pub mode: ChatMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBlocked {
    EmptyInput,
    RequestPending,
}

/// Result of applying a backend answer to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Appended(Role),
    Stale,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    file: Option<SelectedFile>,
    mode: ChatMode,
    default_mode: ChatMode,
    pending: Option<Uuid>,
}

impl ChatSession {
    pub fn new(default_mode: ChatMode) -> Self {
        Self {
            messages: Vec::new(),
            file: None,
            mode: default_mode,
            default_mode,
            pending: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn attach_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    /// Mode the next [`ChatSession::reset`] starts from
    pub fn set_default_mode(&mut self, mode: ChatMode) {
        self.default_mode = mode;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_send(&self, input: &str) -> bool {
        self.check_send(input).is_ok()
    }

    fn check_send(&self, input: &str) -> Result<(), SendBlocked> {
        if self.pending.is_some() {
            return Err(SendBlocked::RequestPending);
        }
        if input.trim().is_empty() {
            return Err(SendBlocked::EmptyInput);
        }
        Ok(())
    }

    /// Record the user's question and mark a request as outstanding
    pub fn begin_send(&mut self, input: &str) -> Result<PendingQuestion, SendBlocked> {
        self.check_send(input)?;

        let question = input.trim().to_string();
        let request_id = Uuid::new_v4();
        self.messages.push(Message::user(question.clone(), self.mode));
        self.pending = Some(request_id);

        Ok(PendingQuestion {
            request_id,
            question,
            mode: self.mode,
        })
    }

    /// Append the single reply bubble for the outstanding request
    pub fn settle(&mut self, request_id: Uuid, outcome: Result<String, ClientError>) -> Settled {
        if self.pending != Some(request_id) {
            tracing::debug!(%request_id, "dropping answer for a request that is no longer current");
            return Settled::Stale;
        }
        self.pending = None;

        let mode = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.mode)
            .unwrap_or(self.mode);

        match outcome {
            Ok(answer) => {
                self.messages.push(Message::assistant(answer, mode));
                Settled::Appended(Role::Assistant)
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.messages.push(Message::error(FALLBACK_ANSWER));
                Settled::Appended(Role::Error)
            }
        }
    }

    pub fn last_answer(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.file = None;
        self.pending = None;
        self.mode = self.default_mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn reset_returns_to_updated_default_mode() {
        let mut session = ChatSession::new(ChatMode::Rag);
        session.set_mode(ChatMode::FileOnly);
        session.reset();
        assert_eq!(session.mode(), ChatMode::Rag);

        session.set_default_mode(ChatMode::FileOnly);
        session.reset();
        assert_eq!(session.mode(), ChatMode::FileOnly);
    }

    #[test]
    fn send_appends_user_bubble_immediately() {
        let mut session = ChatSession::new(ChatMode::Rag);
        let pending = session.begin_send("  what is this about?  ").unwrap();

        assert_eq!(pending.question, "what is this about?");
        assert_eq!(pending.mode, ChatMode::Rag);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].content, "what is this about?");
        assert!(session.is_pending());
    }

    #[test]
    fn blank_input_is_refused() {
        let mut session = ChatSession::new(ChatMode::Rag);
        assert!(!session.can_send(""));
        assert!(!session.can_send(" \t\n"));
        assert_eq!(session.begin_send("   "), Err(SendBlocked::EmptyInput));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn second_send_waits_for_the_first() {
        let mut session = ChatSession::new(ChatMode::Rag);
        let first = session.begin_send("one").unwrap();
        assert!(!session.can_send("two"));
        assert_eq!(session.begin_send("two"), Err(SendBlocked::RequestPending));

        session.settle(first.request_id, Ok("answer".into()));
        assert!(session.can_send("two"));
    }

    #[test]
    fn exactly_one_reply_per_question() {
        let mut session = ChatSession::new(ChatMode::Rag);
        let pending = session.begin_send("q").unwrap();

        assert_eq!(
            session.settle(pending.request_id, Ok("X".into())),
            Settled::Appended(Role::Assistant)
        );
        assert_eq!(session.settle(pending.request_id, Ok("again".into())), Settled::Stale);

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, "X");
        assert_eq!(session.last_answer().map(|m| m.content.as_str()), Some("X"));
    }

    #[test]
    fn failures_become_the_fallback_bubble() {
        let mut session = ChatSession::new(ChatMode::Rag);
        let pending = session.begin_send("q").unwrap();

        let settled = session.settle(
            pending.request_id,
            Err(ClientError::Status(StatusCode::BAD_GATEWAY)),
        );

        assert_eq!(settled, Settled::Appended(Role::Error));
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Error);
        assert_eq!(last.content, FALLBACK_ANSWER);
        assert!(!session.is_pending());
    }

    #[test]
    fn reply_after_reset_is_dropped() {
        let mut session = ChatSession::new(ChatMode::Rag);
        session.set_mode(ChatMode::FileOnly);
        let pending = session.begin_send("q").unwrap();

        session.reset();
        assert_eq!(session.settle(pending.request_id, Ok("late".into())), Settled::Stale);
        assert!(session.messages().is_empty());
        assert!(session.file().is_none());
        assert_eq!(session.mode(), ChatMode::Rag);
    }

    #[test]
    fn reply_carries_the_mode_it_was_asked_in() {
        let mut session = ChatSession::new(ChatMode::Rag);
        session.set_mode(ChatMode::FileOnly);
        let pending = session.begin_send("q").unwrap();
        session.set_mode(ChatMode::Rag);

        session.settle(pending.request_id, Ok("a".into()));
        assert_eq!(session.messages()[1].mode, Some(ChatMode::FileOnly));
    }
}
