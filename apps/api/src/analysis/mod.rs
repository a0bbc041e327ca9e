// Analysis pipeline: dispatcher → extractor → fallback, behind the orchestrator.
// All LLM calls go through llm_client: no direct provider HTTP calls here.

pub mod career_tracks;
pub mod dispatcher;
pub mod extractor;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod supersede;
