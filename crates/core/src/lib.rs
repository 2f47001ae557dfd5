//! Project Coach Core
//!
//! The conversational controller behind the coach: a session model, a command
//! interpreter for learner messages, the phase state machine, and the turn
//! orchestrator that ties them to the content generator and reference lookup.
//! Presentation layers (the CLI) only ever call [`TurnOrchestrator::run_turn`]
//! and read the resulting [`Session`].

pub mod command;
pub mod controller;
pub mod docs;
pub mod generator;
pub mod llm_client;
pub mod orchestrator;
pub mod prompts;
pub mod session;

pub use command::Intent;
pub use docs::{DocEntry, DocLookup, InMemoryDocStore};
pub use generator::{ContentGenerator, GeneratorError, LLMContentGenerator, MockContentGenerator};
pub use orchestrator::TurnOrchestrator;
pub use session::{Level, Message, Phase, Role, Session, Stage};
