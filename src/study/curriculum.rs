//! Curriculum and profile editing

use crate::error::{OrbitError, Result};
use crate::store::{StudyDocument, YearUnits};

/// Difficulty levels, easiest first
pub const DIFFICULTY_LEVELS: [&str; 4] = [
    "Easy (Review)",
    "Medium (Standard)",
    "Hard (Exam Prep)",
    "Asian Parent Expectations (Extreme)",
];

/// Resolve user input to a difficulty level.
///
/// Accepts a 1-based number, a full level name, or the start of one
/// (case-insensitive).
pub fn resolve_difficulty(input: &str) -> Option<&'static str> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| DIFFICULTY_LEVELS.get(i)).copied();
    }

    let lower = input.to_lowercase();
    DIFFICULTY_LEVELS
        .iter()
        .find(|level| level.to_lowercase() == lower)
        .or_else(|| {
            DIFFICULTY_LEVELS
                .iter()
                .find(|level| level.to_lowercase().starts_with(&lower))
        })
        .copied()
}

impl StudyDocument {
    /// Years in the unit inventory
    pub fn years(&self) -> Vec<&str> {
        self.unit_inventory.keys().map(String::as_str).collect()
    }

    /// Semesters of `year`; empty for years kept as a flat list
    pub fn semesters(&self, year: &str) -> Result<Vec<&str>> {
        match self.year(year)? {
            YearUnits::Semesters(sems) => Ok(sems.keys().map(String::as_str).collect()),
            YearUnits::Flat(_) => Ok(Vec::new()),
        }
    }

    /// Units offered in `year`, narrowed to `semester` when the year is split
    pub fn available_units(&self, year: &str, semester: Option<&str>) -> Result<Vec<String>> {
        match self.year(year)? {
            YearUnits::Flat(units) => Ok(units.clone()),
            YearUnits::Semesters(sems) => {
                let semester = semester.ok_or_else(|| {
                    OrbitError::Invalid(format!(
                        "{} is split by semester, pick one of: {}",
                        year,
                        sems.keys().cloned().collect::<Vec<_>>().join(", ")
                    ))
                })?;
                sems.get(semester).cloned().ok_or_else(|| {
                    OrbitError::Invalid(format!("Unknown semester {} in {}", semester, year))
                })
            }
        }
    }

    fn year(&self, year: &str) -> Result<&YearUnits> {
        self.unit_inventory
            .get(year)
            .ok_or_else(|| OrbitError::Invalid(format!("Unknown year: {}", year)))
    }

    /// Append units not already loaded; true when anything was added
    pub fn add_units(&mut self, units: &[String]) -> bool {
        let mut changed = false;
        for unit in units {
            if !self.current_units.contains(unit) {
                self.current_units.push(unit.clone());
                changed = true;
            }
        }
        changed
    }

    /// Remove a unit from the loadout; true when it was present
    pub fn drop_unit(&mut self, unit: &str) -> bool {
        let before = self.current_units.len();
        self.current_units.retain(|u| u != unit);
        self.current_units.len() != before
    }

    /// Set the difficulty from user input; true when it changed
    pub fn set_difficulty(&mut self, input: &str) -> Result<bool> {
        let level = resolve_difficulty(input)
            .ok_or_else(|| OrbitError::Invalid(format!("Unknown difficulty: {}", input)))?;
        if self.difficulty == level {
            return Ok(false);
        }
        self.difficulty = level.to_string();
        Ok(true)
    }

    /// Index of the current difficulty, the hardest level when unrecognized
    pub fn difficulty_index(&self) -> usize {
        DIFFICULTY_LEVELS
            .iter()
            .position(|level| *level == self.difficulty)
            .unwrap_or(DIFFICULTY_LEVELS.len() - 1)
    }

    /// Replace interests from a comma-separated string
    pub fn set_interests_from(&mut self, text: &str) {
        self.interests = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> StudyDocument {
        serde_json::from_str(
            r#"{
                "current_units": ["Compilers"],
                "unit_inventory": {
                    "Year 3": {"Sem 1": ["Compilers", "Networks"], "Sem 2": ["Databases"]},
                    "Year 4": ["Thesis", "Ethics"]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_difficulty() {
        assert_eq!(resolve_difficulty("1"), Some("Easy (Review)"));
        assert_eq!(resolve_difficulty("4"), Some(DIFFICULTY_LEVELS[3]));
        assert_eq!(resolve_difficulty("0"), None);
        assert_eq!(resolve_difficulty("5"), None);
        assert_eq!(resolve_difficulty("hard (exam prep)"), Some("Hard (Exam Prep)"));
        assert_eq!(resolve_difficulty("asian"), Some(DIFFICULTY_LEVELS[3]));
        assert_eq!(resolve_difficulty("impossible"), None);
        assert_eq!(resolve_difficulty("  "), None);
    }

    #[test]
    fn test_inventory_navigation() {
        let doc = doc();
        assert_eq!(doc.years(), vec!["Year 3", "Year 4"]);
        assert_eq!(doc.semesters("Year 3").unwrap(), vec!["Sem 1", "Sem 2"]);
        assert!(doc.semesters("Year 4").unwrap().is_empty());
        assert!(doc.semesters("Year 9").is_err());

        assert_eq!(
            doc.available_units("Year 3", Some("Sem 2")).unwrap(),
            vec!["Databases"]
        );
        assert_eq!(doc.available_units("Year 4", None).unwrap().len(), 2);
        assert!(doc.available_units("Year 3", None).is_err());
        assert!(doc.available_units("Year 3", Some("Sem 5")).is_err());
    }

    #[test]
    fn test_add_and_drop_units() {
        let mut doc = doc();
        let adds = vec!["Compilers".to_string(), "Networks".to_string()];
        assert!(doc.add_units(&adds));
        assert_eq!(doc.current_units, vec!["Compilers", "Networks"]);
        assert!(!doc.add_units(&adds));

        assert!(doc.drop_unit("Compilers"));
        assert!(!doc.drop_unit("Compilers"));
        assert_eq!(doc.current_units, vec!["Networks"]);
    }

    #[test]
    fn test_difficulty_changes() {
        let mut doc = doc();
        assert_eq!(doc.difficulty_index(), 3);
        assert!(doc.set_difficulty("2").unwrap());
        assert_eq!(doc.difficulty, "Medium (Standard)");
        assert_eq!(doc.difficulty_index(), 1);
        assert!(!doc.set_difficulty("medium").unwrap());
        assert!(doc.set_difficulty("nightmare").is_err());

        doc.difficulty = "Custom".to_string();
        assert_eq!(doc.difficulty_index(), 3);
    }

    #[test]
    fn test_interests_from_text() {
        let mut doc = doc();
        doc.set_interests_from(" chess, , rust ,climbing,");
        assert_eq!(doc.interests, vec!["chess", "rust", "climbing"]);
    }
}
