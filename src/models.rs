use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message in a conversation transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// CEFR tier governing scene content and partner reply complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl ProficiencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "A1",
            ProficiencyLevel::A2 => "A2",
            ProficiencyLevel::B1 => "B1",
            ProficiencyLevel::B2 => "B2",
            ProficiencyLevel::C1 => "C1",
            ProficiencyLevel::C2 => "C2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Some(ProficiencyLevel::A1),
            "A2" => Some(ProficiencyLevel::A2),
            "B1" => Some(ProficiencyLevel::B1),
            "B2" => Some(ProficiencyLevel::B2),
            "C1" => Some(ProficiencyLevel::C1),
            "C2" => Some(ProficiencyLevel::C2),
            _ => None,
        }
    }

    pub fn is_beginner(&self) -> bool {
        matches!(self, ProficiencyLevel::A1 | ProficiencyLevel::A2)
    }
}

impl Default for ProficiencyLevel {
    fn default() -> Self {
        ProficiencyLevel::B1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub user_id: String,
    pub scene_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Flattened scene content used to frame one turn. Level-specific fields
/// are empty when the scene has no content authored for that level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneContext {
    pub title: String,
    pub setting: String,
    pub vocabulary: Vec<String>,
    pub phrases: Vec<String>,
    pub questions: Vec<String>,
}

/// One persisted learning observation derived from tutor feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackItem {
    UnfamiliarWord {
        word: String,
        context: Option<String>,
    },
    GrammarCorrection {
        incorrect: String,
        corrected: String,
        explanation: Option<String>,
    },
    WordSuggestion {
        original: String,
        suggested: String,
    },
    ExpressionSuggestion {
        original: String,
        suggested: String,
    },
}

impl FeedbackItem {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedbackItem::UnfamiliarWord { .. } => "unfamiliar_word",
            FeedbackItem::GrammarCorrection { .. } => "grammar_correction",
            FeedbackItem::WordSuggestion { .. } => "word_suggestion",
            FeedbackItem::ExpressionSuggestion { .. } => "expression_suggestion",
        }
    }
}

/// The four feedback collections a tutor turn produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackBundle {
    #[serde(default)]
    pub unfamiliar_words: Vec<String>,
    #[serde(default)]
    pub grammar_errors: BTreeMap<String, String>,
    #[serde(default)]
    pub not_so_good_expressions: BTreeMap<String, String>,
    #[serde(default)]
    pub best_fit_words: BTreeMap<String, String>,
}

impl FeedbackBundle {
    pub fn is_empty(&self) -> bool {
        self.unfamiliar_words.is_empty()
            && self.grammar_errors.is_empty()
            && self.not_so_good_expressions.is_empty()
            && self.best_fit_words.is_empty()
    }

    /// Decomposes the bundle into independently persistable items.
    pub fn items(&self) -> Vec<FeedbackItem> {
        let mut items = Vec::new();
        for word in &self.unfamiliar_words {
            items.push(FeedbackItem::UnfamiliarWord {
                word: word.clone(),
                context: None,
            });
        }
        for (incorrect, corrected) in &self.grammar_errors {
            items.push(FeedbackItem::GrammarCorrection {
                incorrect: incorrect.clone(),
                corrected: corrected.clone(),
                explanation: None,
            });
        }
        for (original, suggested) in &self.best_fit_words {
            items.push(FeedbackItem::WordSuggestion {
                original: original.clone(),
                suggested: suggested.clone(),
            });
        }
        for (original, suggested) in &self.not_so_good_expressions {
            items.push(FeedbackItem::ExpressionSuggestion {
                original: original.clone(),
                suggested: suggested.clone(),
            });
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(MessageRole::from_str("user"), Some(MessageRole::User));
        assert_eq!(MessageRole::from_str("assistant"), Some(MessageRole::Assistant));
        assert_eq!(MessageRole::from_str("system"), None);
        assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_level_parse_is_case_insensitive() {
        assert_eq!(ProficiencyLevel::from_str("b2"), Some(ProficiencyLevel::B2));
        assert_eq!(ProficiencyLevel::from_str(" C1 "), Some(ProficiencyLevel::C1));
        assert_eq!(ProficiencyLevel::from_str("D1"), None);
    }

    #[test]
    fn test_empty_bundle_has_no_items() {
        let bundle = FeedbackBundle::default();
        assert!(bundle.is_empty());
        assert!(bundle.items().is_empty());
    }

    #[test]
    fn test_bundle_decomposes_into_all_kinds() {
        let mut bundle = FeedbackBundle::default();
        bundle.unfamiliar_words.push("itinerary".into());
        bundle
            .grammar_errors
            .insert("I go yesterday".into(), "I went yesterday".into());
        bundle.best_fit_words.insert("big".into(), "spacious".into());
        bundle
            .not_so_good_expressions
            .insert("very good food".into(), "delicious food".into());

        assert!(!bundle.is_empty());
        let kinds: Vec<&str> = bundle.items().iter().map(|i| i.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "unfamiliar_word",
                "grammar_correction",
                "word_suggestion",
                "expression_suggestion"
            ]
        );
    }
}
