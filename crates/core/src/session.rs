//! Session Model
//!
//! The mutable state threaded through every turn of a coaching conversation:
//! the transcript, what we know about the learner and the project, the learning
//! plan, and where the learner currently is in it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much React/TypeScript experience the coach assumes the learner has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level '{}'", other)),
        }
    }
}

/// Coarse lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Onboarding,
    Planning,
    Coaching,
    /// Transient: stages are being regenerated without resetting progress.
    Replanning,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Onboarding => "onboarding",
            Phase::Planning => "planning",
            Phase::Coaching => "coaching",
            Phase::Replanning => "replanning",
            Phase::Finished => "finished",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// One unit of the generated learning plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub fundamentals: Vec<String>,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LearnerProfile {
    /// `None` until onboarding has run.
    pub assumed_level: Option<Level>,
}

impl LearnerProfile {
    pub fn level(&self) -> Level {
        self.assumed_level.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectSpec {
    pub summary: String,
    features: Vec<String>,
}

impl ProjectSpec {
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Appends a feature, keeping earlier entries in order.
    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.push(feature.into());
    }
}

/// The state container for one learner's conversation.
///
/// Only the crate's turn logic mutates a session; callers read it through the
/// accessors below and render whatever they need.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Vec<Message>,
    pub(crate) learner_profile: LearnerProfile,
    pub(crate) project_spec: ProjectSpec,
    pub(crate) stages: Vec<Stage>,
    pub(crate) current_stage_index: usize,
    pub(crate) phase: Phase,
}

impl Session {
    /// Empty transcript, empty profile and spec, no stages, index 0, `Onboarding`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn learner_profile(&self) -> &LearnerProfile {
        &self.learner_profile
    }

    pub fn project_spec(&self) -> &ProjectSpec {
        &self.project_spec
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The stage the learner is on, or `None` before planning or past the last stage.
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current_stage_index)
    }

    /// Most recent message sent by the learner.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.transcript.iter().rev().find(|m| m.role == Role::User)
    }

    /// Number of stages marked complete, for progress displays.
    pub fn completed_stages(&self) -> usize {
        self.current_stage_index.min(self.stages.len())
    }

    pub(crate) fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(Message::user(content));
    }

    pub(crate) fn push_agent(&mut self, content: impl Into<String>) {
        self.transcript.push(Message::agent(content));
    }

    /// Replaces the whole plan. With `preserve_progress` the index is kept and
    /// clamped to the new final stage; otherwise it restarts at the first stage.
    pub(crate) fn replace_stages(&mut self, stages: Vec<Stage>, preserve_progress: bool) {
        self.stages = stages;
        if !preserve_progress {
            self.current_stage_index = 0;
        } else if let Some(last) = self.stages.len().checked_sub(1) {
            self.current_stage_index = self.current_stage_index.min(last);
        } else {
            self.current_stage_index = 0;
        }
    }

    /// Human-readable summary of the current stage, fed to the content generator.
    pub fn stage_context(&self) -> String {
        let Some(stage) = self.current_stage() else {
            return format!("Project: {}", self.project_spec.summary);
        };
        let mut context = format!(
            "Project: {}\nLearner level: {}\nStage {} of {}: {}\nGoal: {}",
            self.project_spec.summary,
            self.learner_profile.level(),
            self.current_stage_index + 1,
            self.stages.len(),
            stage.name,
            stage.goal,
        );
        if !stage.tasks.is_empty() {
            context.push_str(&format!("\nTasks: {}", stage.tasks.join("; ")));
        }
        if !stage.fundamentals.is_empty() {
            context.push_str(&format!("\nFundamentals: {}", stage.fundamentals.join(", ")));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> Stage {
        Stage {
            name: name.to_string(),
            goal: format!("Finish {}", name),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_session_is_empty_onboarding() {
        let session = Session::new();
        assert!(session.transcript().is_empty());
        assert!(session.stages().is_empty());
        assert_eq!(session.current_stage_index(), 0);
        assert_eq!(session.phase(), Phase::Onboarding);
        assert_eq!(session.learner_profile().assumed_level, None);
        assert!(session.project_spec().features().is_empty());
        assert!(session.current_stage().is_none());
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("Advanced".parse::<Level>(), Ok(Level::Advanced));
        assert_eq!(" beginner ".parse::<Level>(), Ok(Level::Beginner));
        assert!("expert".parse::<Level>().is_err());
        assert_eq!(Level::Intermediate.to_string(), "intermediate");
    }

    #[test]
    fn test_level_serialization() {
        assert_eq!(serde_json::to_string(&Level::Advanced).unwrap(), "\"advanced\"");
        let level: Level = serde_json::from_str("\"intermediate\"").unwrap();
        assert_eq!(level, Level::Intermediate);
    }

    #[test]
    fn test_add_feature_appends_in_order() {
        let mut spec = ProjectSpec::default();
        spec.add_feature("list todos");
        spec.add_feature("auth");
        assert_eq!(spec.features(), ["list todos", "auth"]);
    }

    #[test]
    fn test_replace_stages_resets_without_preserve() {
        let mut session = Session::new();
        session.replace_stages(vec![stage("a"), stage("b"), stage("c")], false);
        session.current_stage_index = 2;
        session.replace_stages(vec![stage("x"), stage("y"), stage("z")], false);
        assert_eq!(session.current_stage_index(), 0);
    }

    #[test]
    fn test_replace_stages_preserves_and_clamps() {
        let mut session = Session::new();
        session.replace_stages(vec![stage("a"), stage("b"), stage("c"), stage("d")], false);
        session.current_stage_index = 3;

        session.replace_stages(vec![stage("x"), stage("y")], true);
        assert_eq!(session.current_stage_index(), 1);

        session.current_stage_index = 0;
        session.replace_stages(vec![stage("x"), stage("y"), stage("z")], true);
        assert_eq!(session.current_stage_index(), 0);
    }

    #[test]
    fn test_last_user_message_skips_agent_messages() {
        let mut session = Session::new();
        session.push_user("first");
        session.push_agent("reply");
        session.push_user("second");
        session.push_agent("another reply");
        assert_eq!(session.last_user_message().unwrap().content, "second");
    }

    #[test]
    fn test_stage_context_mentions_current_stage() {
        let mut session = Session::new();
        session.project_spec.summary = "A todo app".to_string();
        let mut first = stage("Setup");
        first.tasks = vec!["Create the project".to_string()];
        first.fundamentals = vec!["JSX".to_string(), "components".to_string()];
        session.replace_stages(vec![first, stage("State")], false);

        let context = session.stage_context();
        assert!(context.contains("Stage 1 of 2: Setup"));
        assert!(context.contains("Tasks: Create the project"));
        assert!(context.contains("Fundamentals: JSX, components"));
        assert!(context.contains("A todo app"));
    }

    #[test]
    fn test_completed_stages_caps_at_stage_count() {
        let mut session = Session::new();
        session.replace_stages(vec![stage("a"), stage("b")], false);
        session.current_stage_index = 2;
        assert_eq!(session.completed_stages(), 2);
        assert!(session.current_stage().is_none());
    }
}
