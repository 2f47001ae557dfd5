//! Phase Controller
//!
//! The only place phase transitions happen. [`route`] is the dispatch table
//! that maps `(phase, intent)` to an [`Action`]; [`PhaseController::apply`]
//! carries that action out against the session, calling the content generator
//! and doc lookup where needed and recovering from their failures locally.
//!
//! Every action appends exactly one agent message, except the chains that run
//! planning in the same turn (onboarding, level change, feature addition),
//! which append the acknowledgement followed by the plan summary.

use crate::command::Intent;
use crate::docs::DocLookup;
use crate::generator::{CodeReview, ContentGenerator, ProjectBrief};
use crate::session::{Level, Phase, Session, Stage};
use std::sync::Arc;
use tracing::{info, warn};

/// Default number of reference entries attached to an explanation.
pub const DEFAULT_DOCS_LIMIT: usize = 3;

const FALLBACK_STAGE_NAME: &str = "Project setup and first component";

/// The work selected for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Extract the project brief from the first message, then plan.
    Onboard,
    /// (Re)generate the plan. Progress is kept when coming from `Replanning`.
    Plan,
    Jump(usize),
    ChangeLevel(Level),
    Advance,
    AddFeature(String),
    RemindMenu,
    Exercises(Option<String>),
    ReviewCode(String),
    ShowStage,
    Explain(String),
    Conclude,
}

/// The transition table. Pure: decides what happens, mutates nothing.
pub fn route(phase: Phase, intent: Intent) -> Action {
    match (phase, intent) {
        (Phase::Onboarding, _) => Action::Onboard,
        (Phase::Planning | Phase::Replanning, _) => Action::Plan,
        (Phase::Finished, _) => Action::Conclude,
        (Phase::Coaching, Intent::JumpToStage(index)) => Action::Jump(index),
        (Phase::Coaching, Intent::ChangeLevel(level)) => Action::ChangeLevel(level),
        (Phase::Coaching, Intent::AdvanceStage) => Action::Advance,
        (Phase::Coaching, Intent::AddFeature(feature)) => Action::AddFeature(feature),
        (Phase::Coaching, Intent::ExercisesDone) => Action::RemindMenu,
        (Phase::Coaching, Intent::RequestExercises(topic)) => Action::Exercises(topic),
        (Phase::Coaching, Intent::SubmitCode(snippet)) => Action::ReviewCode(snippet),
        (Phase::Coaching, Intent::ShowStage) => Action::ShowStage,
        (Phase::Coaching, Intent::GenericQuestion(text)) => Action::Explain(text),
    }
}

/// Applies routed actions to a session using the injected collaborators.
pub struct PhaseController {
    generator: Arc<dyn ContentGenerator>,
    docs: Arc<dyn DocLookup>,
    docs_limit: usize,
}

impl PhaseController {
    pub fn new(generator: Arc<dyn ContentGenerator>, docs: Arc<dyn DocLookup>) -> Self {
        Self {
            generator,
            docs,
            docs_limit: DEFAULT_DOCS_LIMIT,
        }
    }

    pub fn with_docs_limit(mut self, docs_limit: usize) -> Self {
        self.docs_limit = docs_limit;
        self
    }

    /// Carries out `action`. `user_text` is the learner message that produced it.
    pub async fn apply(&self, session: &mut Session, action: Action, user_text: &str) {
        match action {
            Action::Onboard => {
                self.onboard(session, user_text).await;
                self.plan(session).await;
            }
            Action::Plan => self.plan(session).await,
            Action::Jump(index) => {
                session.current_stage_index = index;
                let message = announce_stage(session, "Switching stages.");
                session.push_agent(message);
            }
            Action::ChangeLevel(level) => {
                session.learner_profile.assumed_level = Some(level);
                session.push_agent(format!(
                    "Thanks for letting me know. I'll coach you as {} {} learner and adjust your plan.",
                    article(level),
                    level
                ));
                set_phase(session, Phase::Replanning);
                self.plan(session).await;
            }
            Action::Advance => self.advance(session),
            Action::AddFeature(feature) => {
                session.project_spec.add_feature(feature.clone());
                session.push_agent(format!(
                    "Added \"{}\" to your project. Let me rework the plan around it.",
                    feature
                ));
                set_phase(session, Phase::Replanning);
                self.plan(session).await;
            }
            Action::RemindMenu => session.push_agent(menu_reminder()),
            Action::Exercises(topic) => self.exercises(session, topic, user_text).await,
            Action::ReviewCode(snippet) => self.review(session, &snippet, user_text).await,
            Action::ShowStage => {
                let message = announce_stage(session, "Here's where you are.");
                session.push_agent(message);
            }
            Action::Explain(text) => self.explain(session, &text).await,
            Action::Conclude => session.push_agent(
                "This coaching session is finished. Start a new session to build something else.",
            ),
        }
    }

    async fn onboard(&self, session: &mut Session, user_text: &str) {
        let brief = match self.generator.extract_project_spec(user_text).await {
            Ok(brief) => brief,
            Err(e) => {
                warn!(error = %e, "Project extraction failed; using the raw request");
                ProjectBrief {
                    summary: user_text.trim().to_string(),
                    features: Vec::new(),
                    assumed_level: Level::Beginner,
                }
            }
        };

        session.project_spec.summary = brief.summary.clone();
        for feature in brief.features {
            session.project_spec.add_feature(feature);
        }
        session.learner_profile.assumed_level = Some(brief.assumed_level);

        let features = session.project_spec.features();
        let features = if features.is_empty() {
            "the core features".to_string()
        } else {
            features.join(", ")
        };
        session.push_agent(format!(
            "Got it. You want to build: {} with features: {}. I'll assume you're {} with React/TS.",
            brief.summary, features, brief.assumed_level
        ));
        set_phase(session, Phase::Planning);
    }

    /// Runs planning and lands the session in `Coaching` (or `Finished` when
    /// nothing usable came back for a fresh plan).
    async fn plan(&self, session: &mut Session) {
        let preserve_progress = session.phase == Phase::Replanning;
        set_phase(session, Phase::Planning);

        let level = session.learner_profile.level();
        let stages = match self
            .generator
            .generate_plan(
                &session.project_spec.summary,
                session.project_spec.features(),
                level,
            )
            .await
        {
            Ok(stages) => stages,
            Err(e) => {
                warn!(error = %e, "Plan generation failed; using the minimal plan");
                fallback_plan(session)
            }
        };

        if stages.is_empty() {
            if preserve_progress && !session.stages.is_empty() {
                warn!("Replanning produced no stages; keeping the current plan");
                set_phase(session, Phase::Coaching);
                let message = announce_stage(
                    session,
                    "I couldn't rebuild the plan, so we'll carry on with the current one.",
                );
                session.push_agent(message);
            } else {
                warn!("Planning produced no stages; ending the session");
                session.replace_stages(Vec::new(), false);
                set_phase(session, Phase::Finished);
                session.push_agent(
                    "Sorry, I couldn't put together a learning plan for this project, so there is nothing to coach yet. Start a new session with a bit more detail about what you want to build.",
                );
            }
            return;
        }

        session.replace_stages(stages, preserve_progress);
        set_phase(session, Phase::Coaching);
        info!(
            stage_count = session.stages.len(),
            stage_index = session.current_stage_index,
            preserve_progress,
            "Plan ready"
        );

        let heading = if preserve_progress {
            "Here's your updated learning plan:"
        } else {
            "Here's your learning plan with stages:"
        };
        let message = plan_summary(session, heading);
        session.push_agent(message);
    }

    fn advance(&self, session: &mut Session) {
        session.current_stage_index += 1;
        if session.current_stage_index >= session.stages.len() {
            set_phase(session, Phase::Finished);
            session.push_agent(format!(
                "You've completed all {} stages of {}! Great work. Keep building on it, and start a new session whenever you want a fresh project.",
                session.stages.len(),
                session.project_spec.summary
            ));
        } else {
            let message = announce_stage(session, "Nice work, stage complete!");
            session.push_agent(message);
        }
    }

    async fn exercises(&self, session: &mut Session, topic: Option<String>, user_text: &str) {
        let Some(stage) = session.current_stage() else {
            return self.explain(session, user_text).await;
        };
        let level = session.learner_profile.level();
        match self
            .generator
            .generate_exercises(&stage.name, level, topic.as_deref())
            .await
        {
            Ok(exercises) => {
                let focus = topic.unwrap_or_else(|| stage.name.clone());
                session.push_agent(format!(
                    "Here are 3 exercises on {}:\n\n{}\n\nSay \"done with exercises\" when you're finished.",
                    focus, exercises
                ));
            }
            Err(e) => {
                warn!(error = %e, "Exercise generation failed; answering as a question");
                self.explain(session, user_text).await;
            }
        }
    }

    async fn review(&self, session: &mut Session, snippet: &str, user_text: &str) {
        let context = session.stage_context();
        match self.generator.review_code(snippet, &context).await {
            Ok(review) => session.push_agent(format_review(&review)),
            Err(e) => {
                warn!(error = %e, "Code review failed; answering as a question");
                self.explain(session, user_text).await;
            }
        }
    }

    async fn explain(&self, session: &mut Session, text: &str) {
        let fundamentals = session
            .current_stage()
            .map(|stage| stage.fundamentals.join(" "))
            .unwrap_or_default();
        let query = format!("{} {}", fundamentals, text);
        let docs = self.docs.search(query.trim(), self.docs_limit);
        let context = session.stage_context();

        match self
            .generator
            .generate_explanation(&context, &docs, text)
            .await
        {
            Ok(explanation) => session.push_agent(explanation),
            Err(e) => {
                warn!(error = %e, "Explanation failed; sending apology");
                let mut message =
                    "Sorry, I couldn't put together an explanation right now. Please try asking again in a moment."
                        .to_string();
                if !docs.is_empty() {
                    message.push_str("\n\nIn the meantime these references may help:");
                    for doc in &docs {
                        message.push_str(&format!("\n- {}: {}", doc.topic, doc.link));
                    }
                }
                session.push_agent(message);
            }
        }
    }
}

fn set_phase(session: &mut Session, phase: Phase) {
    if session.phase != phase {
        info!(from = %session.phase, to = %phase, "Phase transition");
        session.phase = phase;
    }
}

fn article(level: Level) -> &'static str {
    match level {
        Level::Intermediate | Level::Advanced => "an",
        Level::Beginner => "a",
    }
}

/// Single-stage plan used when plan generation fails.
fn fallback_plan(session: &Session) -> Vec<Stage> {
    vec![Stage {
        name: FALLBACK_STAGE_NAME.to_string(),
        goal: format!(
            "Set up the project for {} and render its first component",
            session.project_spec.summary
        ),
        tasks: vec![
            "Create a React + TypeScript project with Vite".to_string(),
            "Replace the starter page with your own App component".to_string(),
            "Render a first piece of your project's UI".to_string(),
        ],
        fundamentals: vec![
            "jsx".to_string(),
            "components".to_string(),
            "props".to_string(),
        ],
        docs: vec!["https://react.dev/learn/writing-markup-with-jsx".to_string()],
        features: session.project_spec.features().to_vec(),
    }]
}

fn plan_summary(session: &Session, heading: &str) -> String {
    let titles: Vec<&str> = session.stages.iter().map(|s| s.name.as_str()).collect();
    let mut message = format!("{}\n{}", heading, titles.join(" → "));
    message.push_str("\n\n");
    message.push_str(&announce_stage(session, "Let's get started."));
    message
}

fn announce_stage(session: &Session, lead: &str) -> String {
    let Some(stage) = session.current_stage() else {
        return lead.to_string();
    };
    let mut message = format!(
        "{}\nStage {}/{}: {}\nGoal: {}",
        lead,
        session.current_stage_index + 1,
        session.stages.len(),
        stage.name,
        stage.goal
    );
    if !stage.tasks.is_empty() {
        message.push_str("\n\nTasks:");
        for task in &stage.tasks {
            message.push_str(&format!("\n- {}", task));
        }
    }
    if !stage.fundamentals.is_empty() {
        message.push_str(&format!("\n\nFundamentals: {}", stage.fundamentals.join(", ")));
    }
    if !stage.docs.is_empty() {
        message.push_str("\nDocs:");
        for doc in &stage.docs {
            message.push_str(&format!("\n- {}", doc));
        }
    }
    message
}

fn menu_reminder() -> String {
    [
        "Nice job on the exercises! What would you like to do next?",
        "- \"done\" or \"next stage\" to move on",
        "- \"give me exercises\" for another round",
        "- ask any question about this stage",
    ]
    .join("\n")
}

fn format_review(review: &CodeReview) -> String {
    format!(
        "Code review\n\nIssues: {}\n\nFundamentals to revisit: {}\n\nHint: {}",
        review.issues, review.suggested_fundamentals, review.hint
    )
}
