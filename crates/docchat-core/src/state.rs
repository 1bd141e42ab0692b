//! UI-agnostic chat message types
//!
//! These are shared by every front end and don't depend on any specific UI
//! framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single bubble in the chat transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub mode: Option<ChatMode>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, mode: Option<ChatMode>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            mode,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>, mode: ChatMode) -> Self {
        Self::new(Role::User, content, Some(mode))
    }

    pub fn assistant(content: impl Into<String>, mode: ChatMode) -> Self {
        Self::new(Role::Assistant, content, Some(mode))
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content, None)
    }
}

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// Answer strategy hint sent to the backend with every question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    FileOnly,
    #[default]
    Rag,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::FileOnly => "file_only",
            ChatMode::Rag => "rag",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "file_only" | "file-only" | "fileonly" => Some(ChatMode::FileOnly),
            "rag" => Some(ChatMode::Rag),
            _ => None,
        }
    }

    pub fn all() -> Vec<ChatMode> {
        vec![ChatMode::Rag, ChatMode::FileOnly]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatMode::FileOnly => "File only",
            ChatMode::Rag => "RAG",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ChatMode::FileOnly => ChatMode::Rag,
            ChatMode::Rag => ChatMode::FileOnly,
        }
    }
}
