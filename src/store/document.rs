//! Study Document
//!
//! The flat JSON document holding the profile, curriculum and chat sessions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default difficulty for documents that do not name one
pub const DEFAULT_DIFFICULTY: &str = "Asian Parent Expectations (Extreme)";

/// Root document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyDocument {
    #[serde(default = "default_user_name")]
    pub user_name: String,

    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Units in the active loadout
    #[serde(default)]
    pub current_units: Vec<String>,

    /// Units available to add, keyed by year
    #[serde(default)]
    pub unit_inventory: BTreeMap<String, YearUnits>,

    #[serde(default)]
    pub interests: Vec<String>,

    /// Messages of the chat in progress
    #[serde(default)]
    pub active_session: Vec<ChatMessage>,

    /// Finished chats, newest first
    #[serde(default)]
    pub archived_sessions: Vec<ArchivedSession>,

    /// Keys Orbit does not know about, preserved on save
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for StudyDocument {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            difficulty: default_difficulty(),
            current_units: Vec::new(),
            unit_inventory: BTreeMap::new(),
            interests: Vec::new(),
            active_session: Vec::new(),
            archived_sessions: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A year's units: either split by semester or a flat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearUnits {
    Semesters(BTreeMap<String, Vec<String>>),
    Flat(Vec<String>),
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in a chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A finished chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedSession {
    /// Local time, "%Y-%m-%d %H:%M"
    pub timestamp: String,

    /// First user message, shortened
    pub summary: String,

    pub messages: Vec<ChatMessage>,
}

impl StudyDocument {
    /// Serialize with four-space indentation
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn default_user_name() -> String {
    "Commander".to_string()
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}
