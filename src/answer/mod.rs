//! Query-time answering: greeting gate, vector retrieval, confidence-tiered
//! generation, and reference assembly.

pub mod engine;
pub mod prompts;

pub use engine::{
    format_similarity, AnswerPayload, Reference, RetrievalAnswerer, GREETING_SENTINEL,
    LOW_CONFIDENCE_RESPONSE, NOTHING_FOUND_RESPONSE, REFERENCE_MAX_DISTANCE,
};
pub use prompts::{
    select_prompt, PromptTemplate, CAUTIOUS_ANSWER, GREETING_CLASSIFIER,
    HIGH_CONFIDENCE_MAX_DISTANCE, MEDIUM_CONFIDENCE_MAX_DISTANCE, PRECISE_ANSWER,
};
