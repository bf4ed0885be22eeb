//! Shared types used across modules
//!
//! Kept here so that the record store and the facade can both name them
//! without depending on each other.

use serde::{Deserialize, Serialize};

/// Kind of exchange recorded in the conversation log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    QuestionAnswer,
    CodeExplanation,
    CodeReview,
    DebugHelp,
    ConceptComparison,
    ResourceRecommendation,
    LearningPathGeneration,
    LearningPathUpdate,
    NextStepSuggestion,
}

impl ConversationType {
    /// Wire name as stored in `conversations.json`
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::QuestionAnswer => "question_answer",
            ConversationType::CodeExplanation => "code_explanation",
            ConversationType::CodeReview => "code_review",
            ConversationType::DebugHelp => "debug_help",
            ConversationType::ConceptComparison => "concept_comparison",
            ConversationType::ResourceRecommendation => "resource_recommendation",
            ConversationType::LearningPathGeneration => "learning_path_generation",
            ConversationType::LearningPathUpdate => "learning_path_update",
            ConversationType::NextStepSuggestion => "next_step_suggestion",
        }
    }
}

impl std::fmt::Display for ConversationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
