//! Keyword and structural heuristics scoring a question group for topical
//! relevance. Pure functions over text, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

static DOMAIN_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"python|pandas|numpy|django|flask|\bdef\b|\bclass\b|\bimport\b|\bself\b")
        .expect("domain keyword pattern")
});

static COMPETING_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"php|objective-c|java|c#|swift|javascript").expect("competing keyword pattern")
});

const CODE_FENCE: &str = "```";

/// Relevance signals derived from one consolidated question group.
///
/// Never persisted; computed per group during ingestion and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceFlags {
    /// Number of in-domain keyword matches across question and answer text.
    pub signal_count: usize,
    /// Whether any competing-language keyword appears.
    pub has_competing_language_signal: bool,
    /// Whether the answer text carries a fenced code block.
    pub has_code_block: bool,
}

impl RelevanceFlags {
    /// A group is kept when it shows at least three in-domain signals, no
    /// competing-language signal, and a code fence in the answer.
    pub fn retain(&self) -> bool {
        self.signal_count >= 3 && !self.has_competing_language_signal && self.has_code_block
    }
}

/// Scores a question and its consolidated answer text.
///
/// Keyword matching runs over the lower-cased concatenation of both texts;
/// the code-fence check looks at the answer only.
pub fn classify(question: &str, consolidated_answer: &str) -> RelevanceFlags {
    let haystack = format!(
        "{} {}",
        question.to_lowercase(),
        consolidated_answer.to_lowercase()
    );
    RelevanceFlags {
        signal_count: DOMAIN_KEYWORDS.find_iter(&haystack).count(),
        has_competing_language_signal: COMPETING_KEYWORDS.is_match(&haystack),
        has_code_block: consolidated_answer.contains(CODE_FENCE),
    }
}
