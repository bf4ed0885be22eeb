//! Mentor facade
//!
//! One method per capability. Each call validates its request, asks the
//! completion collaborator, then records the exchange in the record store.
//! A result that could not be recorded is still returned, with a
//! `persistenceWarning` attached.

pub mod requests;
pub mod responses;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::prompts::{self, PLANNER_SYSTEM_PROMPT, TUTOR_SYSTEM_PROMPT};
use crate::agent::{OpenRouterClient, TextCompletion};
use crate::config::Config;
use crate::error::{MentorError, Result};
use crate::memory::{ClearReport, NewConversation, Progress, RecordStore, Statistics};
use crate::types::ConversationType;

pub use requests::{
    AskQuestion, CompareConcepts, CreateLearningPath, ExplainCode, GetNextStep, HelpDebug,
    RecommendResources, ReviewCode, UpdateLearningPath,
};
pub use responses::{
    CodeExplanation, CodeReview, ConceptComparison, DebugHelp, DebugProblem, LearningHistory,
    LearningPath, NextStep, PathUpdate, QuestionAnswer, Reply, ResourceRecommendation,
};

/// Conversations included in a learning history
pub const HISTORY_CONVERSATION_LIMIT: usize = 20;

/// Orchestrates completion calls and persistence for every capability
#[derive(Clone)]
pub struct TechMentor {
    store: Arc<RecordStore>,
    completion: Arc<dyn TextCompletion>,
}

impl TechMentor {
    pub fn new(store: Arc<RecordStore>, completion: Arc<dyn TextCompletion>) -> Self {
        Self { store, completion }
    }

    /// Open the configured storage root and connect the completion client
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let root = config.storage_root()?;
        let store = RecordStore::open(&root)
            .await
            .with_context(|| format!("Failed to open record store at {}", root.display()))?;
        let client = OpenRouterClient::from_config(config)?;
        info!("Record store ready at {}, model {}", root.display(), client.model());
        Ok(Self::new(Arc::new(store), Arc::new(client)))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn ask_question(&self, user_id: &str, request: AskQuestion) -> Result<Reply<QuestionAnswer>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::question_prompt(
            &request.question,
            request.context.as_deref(),
            level(&request.user_level),
        );
        let answer = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = QuestionAnswer {
            question: request.question.clone(),
            answer,
            answered_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::QuestionAnswer, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn explain_code(&self, user_id: &str, request: ExplainCode) -> Result<Reply<CodeExplanation>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let language = request.language.clone().unwrap_or_default();
        let prompt = prompts::explain_code_prompt(
            &request.code,
            &language,
            request.specific_question.as_deref(),
        );
        let explanation = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = CodeExplanation {
            code: request.code.clone(),
            language,
            explanation,
            explained_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::CodeExplanation, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn review_code(&self, user_id: &str, request: ReviewCode) -> Result<Reply<CodeReview>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::review_code_prompt(
            &request.code,
            request.language.as_deref().unwrap_or_default(),
            request.context.as_deref(),
        );
        let review = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = CodeReview {
            original_code: request.code.clone(),
            review,
            reviewed_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::CodeReview, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn help_debug(&self, user_id: &str, request: HelpDebug) -> Result<Reply<DebugHelp>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::debug_prompt(
            &request.code,
            &request.error,
            &request.expected_behavior,
            &request.actual_behavior,
        );
        let solution = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = DebugHelp {
            problem: DebugProblem {
                code: request.code.clone(),
                error: request.error.clone(),
                expected_behavior: request.expected_behavior.clone(),
                actual_behavior: request.actual_behavior.clone(),
            },
            solution,
            solved_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::DebugHelp, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn compare_concepts(
        &self,
        user_id: &str,
        request: CompareConcepts,
    ) -> Result<Reply<ConceptComparison>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::compare_prompt(
            &request.concept1,
            &request.concept2,
            request.context.as_deref(),
        );
        let comparison = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = ConceptComparison {
            concepts: [request.concept1.clone(), request.concept2.clone()],
            comparison,
            compared_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::ConceptComparison, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn recommend_resources(
        &self,
        user_id: &str,
        request: RecommendResources,
    ) -> Result<Reply<ResourceRecommendation>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let user_level = level(&request.user_level).to_string();
        let prompt = prompts::resources_prompt(
            &request.topic,
            &user_level,
            request.resource_type.as_deref().unwrap_or_default(),
        );
        let resources = self.complete(TUTOR_SYSTEM_PROMPT, &prompt).await?;

        let output = ResourceRecommendation {
            topic: request.topic.clone(),
            user_level,
            resources,
            recommended_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::ResourceRecommendation, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    /// Generate a learning path. Stores both a learning-path record and the
    /// conversation.
    pub async fn create_learning_path(
        &self,
        user_id: &str,
        request: CreateLearningPath,
    ) -> Result<Reply<LearningPath>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let current_level = request.current_level.clone().unwrap_or_default();
        let goal = request.goal.clone().unwrap_or_default();
        let prompt = prompts::learning_path_prompt(
            &request.technology,
            &current_level,
            &goal,
            request.time_commitment.as_deref().unwrap_or_default(),
        );
        let learning_path = self.complete(PLANNER_SYSTEM_PROMPT, &prompt).await?;

        let output = LearningPath {
            technology: request.technology.clone(),
            current_level,
            goal,
            learning_path,
            generated_at: Utc::now(),
        };
        let warning = self
            .record(
                user_id,
                ConversationType::LearningPathGeneration,
                &request,
                &output,
                Some(output.clone()),
            )
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn update_learning_path(
        &self,
        user_id: &str,
        request: UpdateLearningPath,
    ) -> Result<Reply<PathUpdate>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::update_path_prompt(&request.current_path, &request.feedback, &request.progress);
        let updated_path = self.complete(PLANNER_SYSTEM_PROMPT, &prompt).await?;

        let output = PathUpdate {
            updated_path,
            updated_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::LearningPathUpdate, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn get_next_step(&self, user_id: &str, request: GetNextStep) -> Result<Reply<NextStep>> {
        check_user(user_id)?;
        let request = request.normalize()?;
        let prompt = prompts::next_step_prompt(&request.learning_path, &request.completed_topics);
        let next_step = self.complete(PLANNER_SYSTEM_PROMPT, &prompt).await?;

        let output = NextStep {
            next_step,
            suggested_at: Utc::now(),
        };
        let warning = self
            .record(user_id, ConversationType::NextStepSuggestion, &request, &output, None)
            .await;
        Ok(Reply::new(output, warning))
    }

    pub async fn get_statistics(&self, user_id: &str) -> Result<Statistics> {
        self.store.get_statistics(user_id).await
    }

    /// All learning paths plus the most recent conversations, newest first
    pub async fn get_learning_history(&self, user_id: &str) -> Result<LearningHistory> {
        let learning_paths = self.store.get_learning_paths(user_id).await?;
        let recent_conversations = self
            .store
            .get_conversations(user_id, Some(HISTORY_CONVERSATION_LIMIT))
            .await?;
        Ok(LearningHistory {
            learning_paths,
            recent_conversations,
        })
    }

    pub async fn update_progress(&self, user_id: &str, progress: Progress) -> Result<Progress> {
        check_user(user_id)?;
        self.store.update_progress(user_id, progress).await
    }

    pub async fn clear_user_data(&self, user_id: &str) -> Result<ClearReport> {
        check_user(user_id)?;
        self.store.clear_user_data(user_id).await
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        debug!("Requesting completion ({} prompt bytes)", prompt.len());
        let text = self
            .completion
            .complete(system, prompt)
            .await
            .map_err(|e| MentorError::Completion(format!("{:#}", e)))?;
        if text.trim().is_empty() {
            return Err(MentorError::Completion("provider returned an empty completion".to_string()));
        }
        Ok(text)
    }

    /// Persist one exchange. Returns the warning to attach when any write fails.
    async fn record<I: Serialize, O: Serialize>(
        &self,
        user_id: &str,
        kind: ConversationType,
        input: &I,
        output: &O,
        path: Option<LearningPath>,
    ) -> Option<String> {
        let conversation = NewConversation {
            kind,
            input: to_json(input),
            output: to_json(output),
        };
        match self.try_record(user_id, conversation, path).await {
            Ok(()) => {
                info!("Recorded {} for {}", kind, user_id);
                None
            }
            Err(e) => {
                warn!("Failed to record {} for {}: {}", kind, user_id, e);
                Some(format!("The result was not saved: {}", e))
            }
        }
    }

    async fn try_record(
        &self,
        user_id: &str,
        conversation: NewConversation,
        path: Option<LearningPath>,
    ) -> Result<()> {
        self.store.ensure_user(user_id).await?;
        if let Some(path) = path {
            self.store.save_learning_path(user_id, path).await?;
        }
        self.store.save_conversation(user_id, conversation).await?;
        Ok(())
    }
}

fn check_user(user_id: &str) -> Result<()> {
    requests::required(user_id, "userId")
}

fn level(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(requests::DEFAULT_USER_LEVEL)
}

// Requests and results are plain structs with string keys, which always serialize.
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
