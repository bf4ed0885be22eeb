//! Capability results
//!
//! Each result echoes the identifying inputs next to the completion text.
//! `Reply` adds the persistence warning without nesting the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::memory::LearningPath;
use crate::memory::{ConversationRecord, LearningPathRecord};

/// A capability result plus an optional note that it was not saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply<T> {
    #[serde(flatten)]
    pub output: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

impl<T> Reply<T> {
    pub fn new(output: T, persistence_warning: Option<String>) -> Self {
        Self {
            output,
            persistence_warning,
        }
    }

    /// True when the exchange was recorded
    pub fn is_persisted(&self) -> bool {
        self.persistence_warning.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExplanation {
    pub code: String,
    pub language: String,
    pub explanation: String,
    pub explained_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReview {
    pub original_code: String,
    pub review: String,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugProblem {
    pub code: String,
    pub error: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugHelp {
    pub problem: DebugProblem,
    pub solution: String,
    pub solved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptComparison {
    pub concepts: [String; 2],
    pub comparison: String,
    pub compared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecommendation {
    pub topic: String,
    pub user_level: String,
    pub resources: String,
    pub recommended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathUpdate {
    pub updated_path: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    pub next_step: String,
    pub suggested_at: DateTime<Utc>,
}

/// Learning paths and recent conversations of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningHistory {
    pub learning_paths: Vec<LearningPathRecord>,
    pub recent_conversations: Vec<ConversationRecord>,
}
