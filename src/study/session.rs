//! Chat sessions and the archive

use crate::store::{ArchivedSession, ChatMessage, Role, StudyDocument};
use chrono::NaiveDateTime;

/// Archived sessions kept in the document
pub const MAX_ARCHIVED_SESSIONS: usize = 10;

/// Summary length before truncation
pub const SUMMARY_CHARS: usize = 40;

/// Archive timestamp format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Summary of a session: its first user message, shortened
pub fn summarize(messages: &[ChatMessage]) -> String {
    let first = messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("Empty Session");

    if first.chars().count() > SUMMARY_CHARS {
        let head: String = first.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", head)
    } else {
        first.to_string()
    }
}

/// Move the active session to the front of the archive and clear it.
/// Returns false when there was nothing to archive.
pub fn archive_active_session(doc: &mut StudyDocument, now: NaiveDateTime) -> bool {
    if doc.active_session.is_empty() {
        return false;
    }

    let messages = std::mem::take(&mut doc.active_session);
    let archive = ArchivedSession {
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        summary: summarize(&messages),
        messages,
    };

    doc.archived_sessions.insert(0, archive);
    doc.archived_sessions.truncate(MAX_ARCHIVED_SESSIONS);
    true
}
