//! Capability requests
//!
//! Every request deserializes leniently (missing fields become blank) and is
//! checked by `normalize`, which rejects blank required fields and fills in
//! defaults. The normalized request is what gets recorded as conversation
//! input.

use serde::{Deserialize, Serialize};

use crate::error::{MentorError, Result};

pub const DEFAULT_USER_LEVEL: &str = "intermediate";
pub const DEFAULT_LANGUAGE: &str = "javascript";
pub const DEFAULT_RESOURCE_TYPE: &str = "all";
pub const DEFAULT_CURRENT_LEVEL: &str = "beginner";
pub const DEFAULT_TIME_COMMITMENT: &str = "1-2 hours per day";

/// Fail with `InvalidInput` when `value` is blank
pub(crate) fn required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MentorError::missing(field));
    }
    Ok(())
}

/// Replace an absent or blank value with `default`
fn or_default(value: &mut Option<String>, default: impl Into<String>) {
    if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
        *value = Some(default.into());
    }
}

/// Drop blank optional text
fn blank_to_none(value: &mut Option<String>) {
    if value.as_deref().map_or(false, |v| v.trim().is_empty()) {
        *value = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AskQuestion {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub user_level: Option<String>,
}

impl AskQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn normalize(mut self) -> Result<Self> {
        required(&self.question, "question")?;
        blank_to_none(&mut self.context);
        or_default(&mut self.user_level, DEFAULT_USER_LEVEL);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplainCode {
    pub code: String,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_question: Option<String>,
}

impl ExplainCode {
    pub fn normalize(mut self) -> Result<Self> {
        required(&self.code, "code")?;
        or_default(&mut self.language, DEFAULT_LANGUAGE);
        blank_to_none(&mut self.specific_question);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewCode {
    pub code: String,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ReviewCode {
    pub fn normalize(mut self) -> Result<Self> {
        required(&self.code, "code")?;
        or_default(&mut self.language, DEFAULT_LANGUAGE);
        blank_to_none(&mut self.context);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelpDebug {
    pub code: String,
    pub error: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
}

impl HelpDebug {
    pub fn normalize(self) -> Result<Self> {
        required(&self.code, "code")?;
        required(&self.error, "error")?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareConcepts {
    pub concept1: String,
    pub concept2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl CompareConcepts {
    pub fn normalize(mut self) -> Result<Self> {
        required(&self.concept1, "concept1")?;
        required(&self.concept2, "concept2")?;
        blank_to_none(&mut self.context);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendResources {
    pub topic: String,
    pub user_level: Option<String>,
    pub resource_type: Option<String>,
}

impl RecommendResources {
    pub fn normalize(mut self) -> Result<Self> {
        required(&self.topic, "topic")?;
        or_default(&mut self.user_level, DEFAULT_USER_LEVEL);
        or_default(&mut self.resource_type, DEFAULT_RESOURCE_TYPE);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLearningPath {
    pub technology: String,
    pub current_level: Option<String>,
    pub goal: Option<String>,
    pub time_commitment: Option<String>,
}

impl CreateLearningPath {
    pub fn new(technology: impl Into<String>) -> Self {
        Self {
            technology: technology.into(),
            ..Default::default()
        }
    }

    pub fn normalize(mut self) -> Result<Self> {
        required(&self.technology, "technology")?;
        or_default(&mut self.current_level, DEFAULT_CURRENT_LEVEL);
        or_default(&mut self.goal, format!("Learn {}", self.technology.trim()));
        or_default(&mut self.time_commitment, DEFAULT_TIME_COMMITMENT);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateLearningPath {
    pub current_path: String,
    pub feedback: String,
    pub progress: String,
}

impl UpdateLearningPath {
    pub fn normalize(self) -> Result<Self> {
        required(&self.current_path, "currentPath")?;
        required(&self.feedback, "feedback")?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetNextStep {
    pub learning_path: String,
    pub completed_topics: String,
}

impl GetNextStep {
    pub fn normalize(self) -> Result<Self> {
        required(&self.learning_path, "learningPath")?;
        required(&self.completed_topics, "completedTopics")?;
        Ok(self)
    }
}
