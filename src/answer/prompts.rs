//! Prompt templates and confidence-tier selection.
//!
//! The best (lowest) squared-L2 distance of a retrieval decides how the
//! answer is generated: close matches get a direct, assertive prompt;
//! middling matches get a synthesizing prompt that must hedge; anything
//! beyond [`MEDIUM_CONFIDENCE_MAX_DISTANCE`] skips generation entirely.

/// Below this distance the context is treated as a direct answer.
pub const HIGH_CONFIDENCE_MAX_DISTANCE: f32 = 0.85;

/// Below this distance (and above the high band) the context is only
/// thematically related; at or beyond it, generation is skipped.
pub const MEDIUM_CONFIDENCE_MAX_DISTANCE: f32 = 1.1;

/// A template with `{name}` placeholders substituted at render time.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Replaces each `{name}` placeholder with its value. Unknown
    /// placeholders are left in place.
    pub fn render(&self, variables: &[(&str, &str)]) -> String {
        let mut rendered = self.template.to_string();
        for (name, value) in variables {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
    }
}

/// Decides whether a phrase is a greeting. Any output other than the
/// sentinel `other` is itself the reply to send back.
pub static GREETING_CLASSIFIER: PromptTemplate = PromptTemplate::new(
    "You are a greeting classifier. Your job is to check whether a phrase sent \
by a user is a greeting such as \"hello\", \"hi\", or \"good morning\".\n\
- If it is a greeting, reply with an appropriate greeting, such as \"Hello!\" or \"Good evening!\".\n\
- If it is not a greeting, reply with exactly one word: other\n\
Phrase: {question}\n\
Reply:",
);

/// High-confidence tier: the context is expected to answer directly.
pub static PRECISE_ANSWER: PromptTemplate = PromptTemplate::new(
    "You are a precise and direct assistant specialized in Python programming. \
Based strictly on the following context, answer the user's question. \
If the answer contains code, format it properly.\n\n\
Context:\n{context}\n\n\
User question:\n{question}",
);

/// Medium-confidence tier: related material only, so the answer must
/// synthesize and open cautiously.
pub static CAUTIOUS_ANSWER: PromptTemplate = PromptTemplate::new(
    "You are an expert programming assistant and an excellent teacher. The \
context below is thematically related to the user's question but may not \
answer it directly. Your main task is to analyze these practical examples \
and synthesize the general principle they demonstrate. Start your answer \
cautiously (for example: \"Based on the available information...\").\n\n\
Context:\n{context}\n\n\
User question:\n{question}",
);

/// Picks the template for a best-hit distance, or `None` when confidence is
/// too low to attempt generation at all.
pub fn select_prompt(best_distance: f32) -> Option<&'static PromptTemplate> {
    if best_distance < HIGH_CONFIDENCE_MAX_DISTANCE {
        Some(&PRECISE_ANSWER)
    } else if best_distance < MEDIUM_CONFIDENCE_MAX_DISTANCE {
        Some(&CAUTIOUS_ANSWER)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholders() {
        let template = PromptTemplate::new("ctx={context} q={question}");
        assert_eq!(
            template.render(&[("context", "A"), ("question", "B")]),
            "ctx=A q=B"
        );
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        let template = PromptTemplate::new("{question} and {other}");
        assert_eq!(template.render(&[("question", "hi")]), "hi and {other}");
    }

    #[test]
    fn tier_selection_boundaries() {
        assert!(std::ptr::eq(
            select_prompt(0.80).unwrap(),
            &PRECISE_ANSWER
        ));
        assert!(std::ptr::eq(
            select_prompt(1.00).unwrap(),
            &CAUTIOUS_ANSWER
        ));
        assert!(select_prompt(1.20).is_none());
        // Band edges: 0.85 falls into the cautious tier, 1.1 is rejected.
        assert!(std::ptr::eq(
            select_prompt(0.85).unwrap(),
            &CAUTIOUS_ANSWER
        ));
        assert!(select_prompt(1.1).is_none());
    }
}
