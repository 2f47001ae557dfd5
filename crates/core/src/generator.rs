//! Content Generation Service
//!
//! This module defines the contract the coach uses to produce everything it
//! cannot compute itself: the initial project brief, the staged learning plan,
//! explanations, exercises, and code review. Every call may fail or come back
//! in the wrong shape, so results are typed and validated here before the
//! session ever sees them.

use crate::docs::DocEntry;
use crate::llm_client::LLMClient;
use crate::prompts;
use crate::session::{Level, Stage};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Why a content generator call could not be used.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The call itself failed (network, auth, missing template...).
    #[error("content generator unavailable: {0:#}")]
    Unavailable(#[source] anyhow::Error),
    /// The call returned something that does not fit the expected structure.
    #[error("malformed {what} from content generator: {reason}")]
    Malformed { what: &'static str, reason: String },
}

impl GeneratorError {
    fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }
}

/// What onboarding extracts from the learner's first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBrief {
    pub summary: String,
    pub features: Vec<String>,
    pub assumed_level: Level,
}

/// Structured feedback on a submitted snippet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeReview {
    pub issues: String,
    pub suggested_fundamentals: String,
    #[serde(rename = "high_level_hint", alias = "hint")]
    pub hint: String,
}

/// Defines the contract for any service that can generate coaching content.
///
/// Implementations are constructed once at start-up and shared read-only
/// between turns.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn extract_project_spec(&self, user_text: &str) -> Result<ProjectBrief, GeneratorError>;

    /// Produces the stage list for a project. An `Ok` list may still be empty.
    async fn generate_plan(
        &self,
        summary: &str,
        features: &[String],
        level: Level,
    ) -> Result<Vec<Stage>, GeneratorError>;

    async fn generate_explanation(
        &self,
        stage_context: &str,
        docs: &[DocEntry],
        user_text: &str,
    ) -> Result<String, GeneratorError>;

    async fn generate_exercises(
        &self,
        stage_name: &str,
        level: Level,
        topic: Option<&str>,
    ) -> Result<String, GeneratorError>;

    async fn review_code(
        &self,
        snippet: &str,
        stage_context: &str,
    ) -> Result<CodeReview, GeneratorError>;
}

#[derive(Debug, Deserialize)]
struct RawBrief {
    project_summary: String,
    #[serde(default)]
    features: Vec<String>,
    assumed_level: String,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    stages: Vec<Stage>,
}

/// Strips a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &'static str) -> Result<T, GeneratorError> {
    serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GeneratorError::malformed(what, e.to_string()))
}

pub(crate) fn parse_brief(raw: &str) -> Result<ProjectBrief, GeneratorError> {
    let brief: RawBrief = parse_json(raw, "project spec")?;
    let summary = brief.project_summary.trim().to_string();
    if summary.is_empty() {
        return Err(GeneratorError::malformed("project spec", "empty project_summary"));
    }
    let assumed_level = brief
        .assumed_level
        .parse::<Level>()
        .map_err(|e| GeneratorError::malformed("project spec", e))?;
    let features = brief
        .features
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    Ok(ProjectBrief {
        summary,
        features,
        assumed_level,
    })
}

pub(crate) fn parse_plan(raw: &str) -> Result<Vec<Stage>, GeneratorError> {
    let plan: RawPlan = parse_json(raw, "plan")?;
    let stages: Vec<Stage> = plan
        .stages
        .into_iter()
        .filter(|stage| !stage.name.trim().is_empty())
        .collect();
    if stages.is_empty() {
        return Err(GeneratorError::malformed("plan", "no usable stages"));
    }
    Ok(stages)
}

fn non_blank(text: String, what: &'static str) -> Result<String, GeneratorError> {
    if text.trim().is_empty() {
        Err(GeneratorError::malformed(what, "empty response"))
    } else {
        Ok(text.trim().to_string())
    }
}

fn format_docs(docs: &[DocEntry]) -> String {
    if docs.is_empty() {
        return "(none)".to_string();
    }
    docs.iter()
        .map(|d| format!("- {}: {} ({})", d.topic, d.content, d.link))
        .collect::<Vec<_>>()
        .join("\n")
}

/// An implementation of `ContentGenerator` backed by a chat-completion model.
pub struct LLMContentGenerator {
    llm: Arc<dyn LLMClient>,
    prompts: HashMap<String, String>,
}

impl LLMContentGenerator {
    /// Creates a new LLM-based generator.
    ///
    /// # Arguments
    ///
    /// * `llm` - The chat client every call goes through.
    /// * `prompts` - Template map; see [`crate::prompts`] for the expected keys.
    pub fn new(llm: Arc<dyn LLMClient>, prompts: HashMap<String, String>) -> Self {
        Self { llm, prompts }
    }

    async fn ask(&self, template: &str, vars: &[(&str, &str)]) -> Result<String, GeneratorError> {
        let body = self
            .prompts
            .get(template)
            .with_context(|| format!("Missing prompt template: '{}'", template))
            .map_err(GeneratorError::Unavailable)?;
        let system = self
            .prompts
            .get("system_prompt")
            .map(String::as_str)
            .unwrap_or_default();
        let prompt = prompts::render(body, vars);

        debug!(template, "Requesting generated content");
        self.llm
            .complete(system, &prompt)
            .await
            .map_err(GeneratorError::Unavailable)
    }
}

#[async_trait]
impl ContentGenerator for LLMContentGenerator {
    async fn extract_project_spec(&self, user_text: &str) -> Result<ProjectBrief, GeneratorError> {
        let raw = self
            .ask("extract_project_spec", &[("user_text", user_text)])
            .await?;
        parse_brief(&raw)
    }

    async fn generate_plan(
        &self,
        summary: &str,
        features: &[String],
        level: Level,
    ) -> Result<Vec<Stage>, GeneratorError> {
        let features = features.join(", ");
        let raw = self
            .ask(
                "generate_plan",
                &[
                    ("summary", summary),
                    ("features", &features),
                    ("level", level.as_str()),
                ],
            )
            .await?;
        parse_plan(&raw)
    }

    async fn generate_explanation(
        &self,
        stage_context: &str,
        docs: &[DocEntry],
        user_text: &str,
    ) -> Result<String, GeneratorError> {
        let docs = format_docs(docs);
        let raw = self
            .ask(
                "generate_explanation",
                &[
                    ("stage_context", stage_context),
                    ("docs", &docs),
                    ("user_text", user_text),
                ],
            )
            .await?;
        non_blank(raw, "explanation")
    }

    async fn generate_exercises(
        &self,
        stage_name: &str,
        level: Level,
        topic: Option<&str>,
    ) -> Result<String, GeneratorError> {
        let raw = self
            .ask(
                "generate_exercises",
                &[
                    ("stage_name", stage_name),
                    ("level", level.as_str()),
                    ("topic", topic.unwrap_or(stage_name)),
                ],
            )
            .await?;
        non_blank(raw, "exercises")
    }

    async fn review_code(
        &self,
        snippet: &str,
        stage_context: &str,
    ) -> Result<CodeReview, GeneratorError> {
        let raw = self
            .ask(
                "review_code",
                &[("snippet", snippet), ("stage_context", stage_context)],
            )
            .await?;
        parse_json(&raw, "code review")
    }
}

/// A deterministic `ContentGenerator` for offline use and testing.
///
/// Always plans the same five stages and answers with canned text that echoes
/// its inputs, so flows can be exercised without a model or network.
pub struct MockContentGenerator;

impl MockContentGenerator {
    fn stage(name: &str, goal: &str, fundamentals: &[&str], docs: &[&str]) -> Stage {
        Stage {
            name: name.to_string(),
            goal: goal.to_string(),
            tasks: vec![format!("Work through: {}", goal)],
            fundamentals: fundamentals.iter().map(|s| s.to_string()).collect(),
            docs: docs.iter().map(|s| s.to_string()).collect(),
            features: Vec::new(),
        }
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn extract_project_spec(&self, user_text: &str) -> Result<ProjectBrief, GeneratorError> {
        let lower = user_text.to_lowercase();
        let assumed_level = if lower.contains("advanced") {
            Level::Advanced
        } else if lower.contains("intermediate") {
            Level::Intermediate
        } else {
            Level::Beginner
        };
        let mut features = vec!["core screens".to_string()];
        if lower.contains("typescript") {
            features.push("typed components".to_string());
        }
        Ok(ProjectBrief {
            summary: user_text.trim().to_string(),
            features,
            assumed_level,
        })
    }

    async fn generate_plan(
        &self,
        _summary: &str,
        features: &[String],
        _level: Level,
    ) -> Result<Vec<Stage>, GeneratorError> {
        let mut stages = vec![
            Self::stage(
                "Project setup",
                "Scaffold the app and render a first component",
                &["jsx", "components"],
                &["https://react.dev/learn/writing-markup-with-jsx"],
            ),
            Self::stage(
                "Props and composition",
                "Split the UI into components that pass data through props",
                &["props", "state"],
                &["https://react.dev/learn/passing-props-to-a-component"],
            ),
            Self::stage(
                "Local state",
                "Make the UI interactive with useState",
                &["useState", "events"],
                &["https://react.dev/reference/react/useState"],
            ),
            Self::stage(
                "Side effects and data",
                "Load and persist data with useEffect",
                &["useEffect", "fetch"],
                &["https://react.dev/reference/react/useEffect"],
            ),
            Self::stage(
                "Routing and polish",
                "Add navigation and finish the remaining features",
                &["react router"],
                &["https://reactrouter.com/en/main/start/tutorial"],
            ),
        ];
        if let Some(last) = stages.last_mut() {
            last.features = features.to_vec();
        }
        Ok(stages)
    }

    async fn generate_explanation(
        &self,
        stage_context: &str,
        docs: &[DocEntry],
        user_text: &str,
    ) -> Result<String, GeneratorError> {
        let stage_line = stage_context.lines().find(|l| l.starts_with("Stage")).unwrap_or("");
        let mut answer = format!("About \"{}\" ({}):", user_text, stage_line);
        answer.push_str(" break the problem into the smallest component you can render.");
        for doc in docs {
            answer.push_str(&format!("\nSee {}: {}", doc.topic, doc.link));
        }
        Ok(answer)
    }

    async fn generate_exercises(
        &self,
        stage_name: &str,
        level: Level,
        topic: Option<&str>,
    ) -> Result<String, GeneratorError> {
        let focus = topic.unwrap_or(stage_name);
        Ok((1..=3)
            .map(|n| format!("{}. ({}) Exercise {} on {}", n, level, n, focus))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn review_code(
        &self,
        snippet: &str,
        _stage_context: &str,
    ) -> Result<CodeReview, GeneratorError> {
        let lines = snippet.lines().count();
        Ok(CodeReview {
            issues: format!("Looked at {} line(s); nothing blocking stands out.", lines),
            suggested_fundamentals: "component state".to_string(),
            hint: "Keep each component focused on one job.".to_string(),
        })
    }
}
