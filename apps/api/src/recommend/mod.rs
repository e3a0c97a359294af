// Hybrid club recommendation: deterministic rule stages first, generative fallback last.
// All provider calls go through llm_client via the TextGenerator trait.

pub mod catalog;
pub mod digest;
pub mod dispatcher;
pub mod handlers;
pub mod heuristics;
pub mod matcher;
pub mod models;
pub mod prompts;
