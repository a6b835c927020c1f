//! Turning retrieved chunks into a user-facing answer.
//!
//! [`ExtractiveComposer`] does no language-model synthesis: it quotes the top
//! chunks verbatim. A generative composer can replace it by implementing
//! [`AnswerComposer`]; nothing upstream depends on which one is used.

use serde::Serialize;

use crate::document::SearchResult;

/// Reply for an empty or whitespace-only question.
pub const NO_QUESTION_ANSWER: &str = "Please enter a question.";
/// Reply when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str = "I don't know based on the uploaded document.";
/// Header placed before the quoted excerpts.
pub const EXCERPT_HEADER: &str =
    "Here are the most relevant excerpts from your document (grounded retrieval):\n\n";
/// Appended when the excerpts were cut to the character budget.
pub const TRUNCATION_MARKER: &str = "\n\n(Truncated)";

const DEFAULT_MAX_SOURCES: usize = 3;
const DEFAULT_MAX_CHARS: usize = 1500;
const SNIPPET_CHARS: usize = 700;

/// A composed answer and the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Produces an answer from a question and its retrieved chunks.
pub trait AnswerComposer: Send + Sync {
    fn compose(&self, query: &str, sources: Vec<SearchResult>) -> RagAnswer;
}

/// Quotes the top chunks, joined by blank lines and cut to a character budget.
#[derive(Debug, Clone)]
pub struct ExtractiveComposer {
    max_sources: usize,
    max_chars: usize,
}

impl Default for ExtractiveComposer {
    fn default() -> Self {
        Self { max_sources: DEFAULT_MAX_SOURCES, max_chars: DEFAULT_MAX_CHARS }
    }
}

impl ExtractiveComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top chunks quoted (default 3).
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Character budget for the quoted excerpts (default 1500).
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl AnswerComposer for ExtractiveComposer {
    fn compose(&self, query: &str, sources: Vec<SearchResult>) -> RagAnswer {
        if query.trim().is_empty() {
            return RagAnswer { answer: NO_QUESTION_ANSWER.to_string(), sources };
        }
        if sources.is_empty() {
            return RagAnswer { answer: NO_CONTEXT_ANSWER.to_string(), sources: Vec::new() };
        }

        let combined = sources
            .iter()
            .take(self.max_sources)
            .map(|r| r.chunk.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let (excerpt, truncated) = truncate_chars(&combined, self.max_chars);
        let mut answer = String::with_capacity(EXCERPT_HEADER.len() + excerpt.len() + 16);
        answer.push_str(EXCERPT_HEADER);
        answer.push_str(excerpt);
        if truncated {
            answer.push_str(TRUNCATION_MARKER);
        }

        RagAnswer { answer, sources }
    }
}

/// Compose an answer with the default [`ExtractiveComposer`].
pub fn build_rag_answer(query: &str, sources: Vec<SearchResult>) -> RagAnswer {
    ExtractiveComposer::default().compose(query, sources)
}

/// Cut `text` to at most `max` characters. The flag reports whether anything was cut.
fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((byte, _)) => (&text[..byte], true),
        None => (text, false),
    }
}

/// A display-ready reference to one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCitation {
    /// e.g. `Source 2, page 5, report.pdf`
    pub label: String,
    /// The first 700 characters of the chunk, with `...` if longer.
    pub snippet: String,
}

impl SourceCitation {
    /// Number the results from 1 and render a citation for each.
    pub fn from_results(results: &[SearchResult]) -> Vec<Self> {
        results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let metadata = &result.chunk.metadata;
                let mut parts = vec![format!("Source {}", i + 1)];
                if let Some(page) = metadata.page {
                    parts.push(format!("page {page}"));
                }
                if !metadata.source.is_empty() {
                    parts.push(metadata.source.clone());
                }

                let (snippet, truncated) = truncate_chars(&result.chunk.text, SNIPPET_CHARS);
                let snippet =
                    if truncated { format!("{snippet}...") } else { snippet.to_string() };

                Self { label: parts.join(", "), snippet }
            })
            .collect()
    }
}
