//! Turn Orchestrator
//!
//! The single entry point callers use to drive a coaching conversation.

use crate::command;
use crate::controller::{Action, PhaseController, route};
use crate::docs::DocLookup;
use crate::generator::ContentGenerator;
use crate::session::{Message, Phase, Role, Session};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Runs turns against sessions. Holds only read-only collaborators, so one
/// orchestrator can serve any number of independent sessions; each session is
/// owned by its caller and must not be driven by two turns at once.
pub struct TurnOrchestrator {
    controller: PhaseController,
}

impl TurnOrchestrator {
    pub fn new(generator: Arc<dyn ContentGenerator>, docs: Arc<dyn DocLookup>) -> Self {
        Self {
            controller: PhaseController::new(generator, docs),
        }
    }

    /// Sets how many reference entries are looked up per explanation.
    pub fn with_docs_limit(mut self, docs_limit: usize) -> Self {
        self.controller = self.controller.with_docs_limit(docs_limit);
        self
    }

    /// A fresh session in `Onboarding`.
    pub fn create_session(&self) -> Session {
        Session::new()
    }

    /// Processes one learner message and returns the agent messages it produced.
    ///
    /// Blank input is ignored without touching the session. Otherwise the
    /// message is recorded, classified, routed, and applied; collaborator
    /// failures are absorbed so at least one agent message is always added.
    #[instrument(name = "turn", skip_all, fields(phase = %session.phase(), stage_index = session.current_stage_index()))]
    pub async fn run_turn<'s>(&self, session: &'s mut Session, user_text: &str) -> &'s [Message] {
        let text = user_text.trim();
        if text.is_empty() {
            debug!("Ignoring blank message");
            return &[];
        }

        session.push_user(user_text);
        let first_reply = session.transcript().len();

        let action = if session.phase() == Phase::Finished {
            Action::Conclude
        } else {
            let last = session.last_user_message().map_or(text, |m| m.content.as_str());
            let intent = command::classify(last, session.stages().len());
            debug!(intent = intent.name(), "Classified message");
            route(session.phase(), intent)
        };
        debug!(?action, "Routing turn");

        self.controller.apply(session, action, text).await;

        let replies = &session.transcript()[first_reply..];
        if !replies.iter().any(|m| m.role == Role::Agent) {
            warn!("Turn produced no reply; sending a fallback");
            session.push_agent("Sorry, something went wrong on my side. Could you say that again?");
        }
        &session.transcript()[first_reply..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::InMemoryDocStore;
    use crate::generator::MockContentGenerator;

    fn orchestrator() -> TurnOrchestrator {
        TurnOrchestrator::new(
            Arc::new(MockContentGenerator),
            Arc::new(InMemoryDocStore::react_reference()),
        )
    }

    #[tokio::test]
    async fn test_blank_turn_is_a_no_op() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.create_session();
        let replies = orchestrator.run_turn(&mut session, "   \n").await;
        assert!(replies.is_empty());
        assert!(session.transcript().is_empty());
        assert_eq!(session.phase(), Phase::Onboarding);
    }

    #[tokio::test]
    async fn test_classifies_the_recorded_message() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.create_session();
        orchestrator.run_turn(&mut session, "a recipe app").await;

        let raw = "  ```tsx\nconst x: number = 1;\n```\n";
        let replies = orchestrator.run_turn(&mut session, raw).await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].content.starts_with("Code review"));
        assert_eq!(session.last_user_message().unwrap().content, raw);
    }

    #[tokio::test]
    async fn test_returns_only_this_turns_replies() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.create_session();
        orchestrator.run_turn(&mut session, "a recipe app").await;

        let replies = orchestrator.run_turn(&mut session, "what is jsx?").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].role, Role::Agent);
        assert!(replies[0].content.contains("what is jsx?"));
    }

    #[tokio::test]
    async fn test_finished_session_short_circuits() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.create_session();
        orchestrator.run_turn(&mut session, "a recipe app").await;
        orchestrator.run_turn(&mut session, "go to stage 5").await;
        orchestrator.run_turn(&mut session, "done").await;
        assert_eq!(session.phase(), Phase::Finished);

        let before = session.transcript().len();
        let replies = orchestrator.run_turn(&mut session, "go to stage 1").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].content.contains("finished"));
        assert_eq!(session.transcript().len(), before + 2);
        assert_eq!(session.current_stage_index(), 5);
    }
}
