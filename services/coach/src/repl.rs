//! Line-oriented console loop around a [`TurnOrchestrator`].

use anyhow::{Context, Result};
use coach_core::{Phase, Session, TurnOrchestrator};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

const BANNER: &str = "=== React Project Coach ===\n\
Describe the app you want to build and I'll turn it into a staged learning plan.\n\
Type 'help' for commands.";

const HELP: &str = "Commands:\n  \
help                 show this message\n  \
status               show your project, level and stage progress\n  \
quit | exit | q      leave the coach\n\
While coaching you can also say:\n  \
done / next stage / move on       finish the current stage\n  \
go to stage <n>                   jump to a stage\n  \
i'm actually <level>              beginner, intermediate or advanced\n  \
add feature: <description>        extend the project and replan\n  \
give me exercises [for <topic>]   practice the current stage\n  \
```<code>``` (one or more lines)  get a review of a snippet\n  \
show stage                        repeat the current stage\n\
Anything else is treated as a question about the current stage.";

enum Command {
    Help,
    Status,
    Quit,
}

const FENCE: &str = "```";

/// True when `text` opens a code fence it does not close.
fn has_open_fence(text: &str) -> bool {
    text.matches(FENCE).count() % 2 == 1
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "help" => Some(Command::Help),
        "status" => Some(Command::Status),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Renders the project summary, level, features and stage checklist.
pub fn render_status(session: &Session) -> String {
    let spec = session.project_spec();
    if session.stages().is_empty() {
        return "No project yet. Describe the app you want to build to get started.".to_string();
    }

    let mut out = format!(
        "Project: {}\nLevel: {}\n",
        spec.summary,
        session.learner_profile().level()
    );
    if !spec.features().is_empty() {
        out.push_str(&format!("Features: {}\n", spec.features().join(", ")));
    }

    let total = session.stages().len();
    let current = session.current_stage_index();
    let finished = session.phase() == Phase::Finished;
    if finished {
        out.push_str(&format!("All {} stages complete\n", total));
    } else {
        out.push_str(&format!("Stage {} of {}\n", (current + 1).min(total), total));
    }

    for (i, stage) in session.stages().iter().enumerate() {
        let mark = if finished || i < current {
            "[x]"
        } else if i == current {
            "[>]"
        } else {
            "[ ]"
        };
        out.push_str(&format!("  {} {}. {}\n", mark, i + 1, stage.name));
    }
    out.trim_end().to_string()
}

/// Reads learner lines from `input` until EOF or a quit command, writing each
/// turn's replies to `out`. Returns the session for inspection.
pub async fn run<R, W>(orchestrator: &TurnOrchestrator, input: R, out: &mut W) -> Result<Session>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = orchestrator.create_session();
    let mut lines = input.lines();

    writeln!(out, "{}\n\nWhat would you like to build?", BANNER)?;

    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let Some(mut line) = lines.next_line().await.context("Failed to read input")? else {
            debug!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        // A fenced snippet spans several lines but is one utterance.
        while has_open_fence(&line) {
            let Some(next) = lines.next_line().await.context("Failed to read input")? else {
                debug!("Input closed inside a code block");
                line.push('\n');
                line.push_str(FENCE);
                break;
            };
            line.push('\n');
            line.push_str(&next);
        }

        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Help) => writeln!(out, "{}", HELP)?,
            Some(Command::Status) => writeln!(out, "{}", render_status(&session))?,
            None => {
                for reply in orchestrator.run_turn(&mut session, &line).await {
                    writeln!(out, "\nCoach: {}", reply.content)?;
                }
            }
        }
    }

    info!(
        phase = %session.phase(),
        messages = session.transcript().len(),
        "Session ended"
    );
    writeln!(out, "\nGood luck with the build!")?;
    Ok(session)
}
