pub mod client;
pub mod explain;
pub mod generate;

pub use client::{AiConfig, ChatClient};
pub use explain::{
    ExplanationRequest, ExplanationService, FALLBACK_EXPLANATION, sanitize_explanation,
};
pub use generate::{QuestionGenerator, SYLLABUS_TOPIC, parse_generated};
