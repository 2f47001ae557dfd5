//! Reference lookup used to ground coaching explanations.

use serde::{Deserialize, Serialize};

/// A single reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub topic: String,
    pub content: String,
    pub link: String,
}

impl DocEntry {
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            link: link.into(),
        }
    }
}

/// Defines the contract for anything that can answer reference queries.
pub trait DocLookup: Send + Sync {
    /// Returns at most `k` entries ranked by descending relevance. Returns an
    /// empty list, never an error, when nothing matches.
    fn search(&self, query: &str, k: usize) -> Vec<DocEntry>;
}

/// An in-memory store scored by naive keyword overlap.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocStore {
    entries: Vec<DocEntry>,
}

impl InMemoryDocStore {
    pub fn new(entries: Vec<DocEntry>) -> Self {
        Self { entries }
    }

    /// The built-in React reference set.
    pub fn react_reference() -> Self {
        Self::new(vec![
            DocEntry::new(
                "jsx basics",
                "JSX lets you write HTML-like syntax in React components. Each component returns JSX from its render function...",
                "https://react.dev/learn/writing-markup-with-jsx",
            ),
            DocEntry::new(
                "props vs state",
                "Props are read-only inputs to components, passed from parent. State is local and managed inside a component using hooks like useState...",
                "https://react.dev/learn/state-a-components-memory",
            ),
            DocEntry::new(
                "useState hook",
                "useState lets you add state to function components: const [value, setValue] = useState(initial)...",
                "https://react.dev/reference/react/useState",
            ),
            DocEntry::new(
                "useEffect hook",
                "useEffect lets you run side effects in function components, like fetching data or subscribing to events...",
                "https://react.dev/reference/react/useEffect",
            ),
            DocEntry::new(
                "react router",
                "React Router is a library for client-side routing in React apps...",
                "https://reactrouter.com/en/main/start/tutorial",
            ),
        ])
    }

    /// Counts query words (repeats included) that occur anywhere in the entry's
    /// topic or content.
    fn score(entry: &DocEntry, query_words: &[String]) -> usize {
        let text = format!("{} {}", entry.topic, entry.content).to_lowercase();
        query_words
            .iter()
            .filter(|word| text.contains(word.as_str()))
            .count()
    }
}

impl DocLookup for InMemoryDocStore {
    fn search(&self, query: &str, k: usize) -> Vec<DocEntry> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<(usize, &DocEntry)> = self
            .entries
            .iter()
            .map(|entry| (Self::score(entry, &query_words), entry))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort: equal scores keep store order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}
