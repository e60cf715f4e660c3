//! AI-assisted search: keyword extraction, ranking and narration.
//!
//! Both AI steps sit behind traits so the pipeline runs (degraded) with no
//! provider at all.

pub mod capability;
pub mod gemini;
pub mod pipeline;

pub use capability::{CapabilityError, ContextRecord, KeywordExtractor, Narrator};
pub use gemini::GeminiClient;
pub use pipeline::{Answer, Assistant, QuerySession, APOLOGY};
