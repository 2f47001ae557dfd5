//! Command Interpreter
//!
//! Classifies a learner's free-text message into an [`Intent`]. Classification
//! is a pure function of the text and the current stage count: it never fails,
//! and anything it cannot place confidently becomes a `GenericQuestion`.

use crate::session::Level;
use regex::Regex;
use std::sync::LazyLock;

static JUMP_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\b(?:go|jump) to stage\s*#?\s*(\d+)"));
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\bi(?:'|’)?m actually\s+(?:an?\s+)?(\w+)|\bi am actually\s+(?:an?\s+)?(\w+)")
});
static EXERCISES_DONE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bdone with (?:the |my )?exercises?\b"));
static ADVANCE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bdone\b|\bnext stage\b|\bmove on\b"));
static FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\b(?:add|change|new) feature\b"));
static EXERCISE_TOPIC_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bfor\s+(.+)$"));
static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)```(.*?)```"));

/// Fence info strings recognised on a one-line block such as "```tsx const x = 1;```".
const FENCE_LANGUAGES: [&str; 12] = [
    "tsx", "ts", "typescript", "jsx", "js", "javascript", "css", "html", "json", "bash", "sh",
    "shell",
];

// Patterns are literals, so failure here is a programming error caught by the tests below.
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("invalid intent pattern {re:?}: {e}"))
}

/// The code inside a fence, without its info string.
///
/// Multi-line blocks drop the first line when it is a bare info string; one-line
/// blocks drop a leading word only when it names a known language.
fn fence_body(inner: &str) -> &str {
    if let Some((first, rest)) = inner.split_once('\n') {
        let info = first.trim();
        if info.is_empty() || !info.contains(char::is_whitespace) {
            return rest.trim();
        }
        return inner.trim();
    }
    let inner = inner.trim();
    match inner.split_once(char::is_whitespace) {
        Some((word, rest)) if FENCE_LANGUAGES.contains(&word.to_lowercase().as_str()) => rest.trim(),
        _ => inner,
    }
}

const SHOW_STAGE_PHRASES: [&str; 4] = ["continue", "start", "show stage", "current stage"];

/// The classified meaning of a learner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Zero-based index of a stage that exists in the current plan.
    JumpToStage(usize),
    ChangeLevel(Level),
    ExercisesDone,
    AdvanceStage,
    AddFeature(String),
    RequestExercises(Option<String>),
    SubmitCode(String),
    /// Re-announce the current stage.
    ShowStage,
    GenericQuestion(String),
}

impl Intent {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::JumpToStage(_) => "jump_to_stage",
            Intent::ChangeLevel(_) => "change_level",
            Intent::ExercisesDone => "exercises_done",
            Intent::AdvanceStage => "advance_stage",
            Intent::AddFeature(_) => "add_feature",
            Intent::RequestExercises(_) => "request_exercises",
            Intent::SubmitCode(_) => "submit_code",
            Intent::ShowStage => "show_stage",
            Intent::GenericQuestion(_) => "generic_question",
        }
    }
}

/// Classifies `text` against the fixed priority order; the first rule that
/// matches wins.
///
/// `stage_count` bounds jump targets: "go to stage N" with N outside
/// `1..=stage_count` degrades to a generic question.
pub fn classify(text: &str, stage_count: usize) -> Intent {
    let text = text.trim();
    let lower = text.to_lowercase();

    if let Some(caps) = JUMP_RE.captures(text) {
        return match caps[1].parse::<usize>() {
            Ok(n) if n >= 1 && n <= stage_count => Intent::JumpToStage(n - 1),
            _ => generic(text),
        };
    }

    if let Some(caps) = LEVEL_RE.captures(text) {
        let token = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        return match token.and_then(|t| t.parse::<Level>().ok()) {
            Some(level) => Intent::ChangeLevel(level),
            None => generic(text),
        };
    }

    if EXERCISES_DONE_RE.is_match(text) {
        return Intent::ExercisesDone;
    }

    if ADVANCE_RE.is_match(text) && !lower.contains("exercise") {
        return Intent::AdvanceStage;
    }

    if let Some(m) = FEATURE_RE.find(text) {
        let description = text[m.end()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim();
        if description.is_empty() {
            return generic(text);
        }
        return Intent::AddFeature(description.to_string());
    }

    if lower.contains("exercise") || lower.contains("practice") {
        let topic = EXERCISE_TOPIC_RE
            .captures(text)
            .map(|caps| {
                caps[1]
                    .trim()
                    .trim_end_matches(['.', '!', '?'])
                    .trim()
                    .to_string()
            })
            .filter(|t| !t.is_empty());
        return Intent::RequestExercises(topic);
    }

    if let Some(caps) = CODE_BLOCK_RE.captures(text) {
        let snippet = fence_body(caps.get(1).map_or("", |m| m.as_str()));
        if !snippet.is_empty() {
            return Intent::SubmitCode(snippet.to_string());
        }
    }

    if SHOW_STAGE_PHRASES.contains(&lower.as_str()) {
        return Intent::ShowStage;
    }

    generic(text)
}

fn generic(text: &str) -> Intent {
    Intent::GenericQuestion(text.to_string())
}
