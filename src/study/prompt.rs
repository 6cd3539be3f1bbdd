//! Prompt construction

use crate::store::{ChatMessage, StudyDocument};

/// Session messages included as chat context
pub const CONTEXT_MESSAGES: usize = 6;

/// Prompt for a chat turn. `session` already ends with the user's question.
pub fn chat_prompt(doc: &StudyDocument, session: &[ChatMessage], question: &str) -> String {
    let start = session.len().saturating_sub(CONTEXT_MESSAGES);
    let context = session[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are Orbit.\n\
         User studies: {}.\n\
         Difficulty: {}.\n\
         Current Session Context:\n{}\n\
         Current Question: {}",
        doc.current_units.join(", "),
        doc.difficulty,
        context,
        question
    )
}

/// Prompt asking for a raw JSON multiple-choice quiz
pub fn quiz_prompt(unit: &str, question_count: u32, difficulty: &str) -> String {
    format!(
        "Generate {} multiple-choice questions about {} for a 4th Year Student.\n\
         Difficulty: {}.\n\
         Return ONLY a raw JSON list of objects. No markdown.\n\
         Format: [{{\"q\": \"...\", \"o\": [\"A\", \"B\"], \"a\": \"A\", \"e\": \"...\"}}]",
        question_count, unit, difficulty
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_keeps_last_messages() {
        let mut doc = StudyDocument::default();
        doc.current_units = vec!["Compilers".to_string(), "Networks".to_string()];

        let session: Vec<ChatMessage> = (0..8).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        let prompt = chat_prompt(&doc, &session, "m7");

        assert!(prompt.contains("User studies: Compilers, Networks."));
        assert!(prompt.contains("user: m2"));
        assert!(!prompt.contains("user: m1"));
        assert!(prompt.ends_with("Current Question: m7"));
    }

    #[test]
    fn test_quiz_prompt_format() {
        let prompt = quiz_prompt("Databases", 3, "Hard (Exam Prep)");
        assert!(prompt.starts_with("Generate 3 multiple-choice questions about Databases"));
        assert!(prompt.contains(r#"[{"q": "...", "o": ["A", "B"], "a": "A", "e": "..."}]"#));
    }
}
