// Resume Tailoring Engine
// Components of one tailoring run and the controller that sequences them.
// All LLM calls go through llm_client: no direct HTTP calls here.

pub mod analyzer;
pub mod controller;
pub mod coverage;
pub mod critic;
pub mod decision;
pub mod prompts;
pub mod report;
pub mod synthesizer;
