//! Quiz generation, parsing and grading

use crate::error::{OrbitError, Result};
use crate::study::prompt::quiz_prompt;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Upper bound of questions per quiz
pub const MAX_QUESTIONS: u32 = 10;

/// One multiple-choice question, in the compact shape the model is asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(rename = "q")]
    pub question: String,

    #[serde(rename = "o")]
    pub options: Vec<String>,

    #[serde(rename = "a")]
    pub answer: String,

    #[serde(rename = "e", default)]
    pub explanation: String,
}

/// Fresh pseudo-random value for rolling a quiz
pub fn entropy() -> u64 {
    RandomState::new().build_hasher().finish()
}

/// Unit and size of the next quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPlan {
    pub unit: String,
    pub question_count: u32,
}

impl QuizPlan {
    /// Pick a unit and a question count in `1..=MAX_QUESTIONS` from `entropy`
    pub fn roll(units: &[String], entropy: u64) -> Result<Self> {
        if units.is_empty() {
            return Err(OrbitError::Invalid("No units loaded!".to_string()));
        }

        let len = units.len() as u64;
        let unit = units[(entropy % len) as usize].clone();
        let question_count = ((entropy / len) % MAX_QUESTIONS as u64) as u32 + 1;

        Ok(Self {
            unit,
            question_count,
        })
    }

    pub fn prompt(&self, difficulty: &str) -> String {
        quiz_prompt(&self.unit, self.question_count, difficulty)
    }
}

/// Parse the model's reply, tolerating markdown code fences
pub fn parse_questions(text: &str) -> Result<Vec<QuizQuestion>> {
    let clean = text.replace("```json", "").replace("```", "");
    let questions: Vec<QuizQuestion> =
        serde_json::from_str(clean.trim()).map_err(|e| OrbitError::Quiz(e.to_string()))?;

    if questions.is_empty() {
        return Err(OrbitError::Quiz("model returned no questions".to_string()));
    }
    Ok(questions)
}

/// A generated quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub unit: String,
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Grade `answers`, one per question in order; missing answers are wrong
    pub fn grade(&self, answers: &[Option<String>]) -> QuizReport {
        let results: Vec<QuestionResult> = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = answers.get(i).cloned().flatten();
                QuestionResult {
                    correct: chosen.as_deref().map(str::trim) == Some(q.answer.trim()),
                    chosen,
                    answer: q.answer.clone(),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        QuizReport {
            score: results.iter().filter(|r| r.correct).count(),
            total: results.len(),
            results,
        }
    }
}

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub correct: bool,
    pub chosen: Option<String>,
    pub answer: String,
    pub explanation: String,
}

/// Graded quiz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    pub results: Vec<QuestionResult>,
    pub score: usize,
    pub total: usize,
}

impl QuizReport {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}
