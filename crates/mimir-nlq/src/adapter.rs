//! The LLM adapter contract (§4.14, §5): a single synchronous completion
//! call bounded by a 30s deadline. Every other trait in this workspace
//! (`mimir_core::registry::Plugin`, `mimir_graph::GraphBackend`) is
//! synchronous, so this one is too rather than reaching for `async-trait`
//! for a single call site.

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::NlqError;

/// §5 fixes the LLM call's deadline at 30 seconds. Adapters that need a
/// different bound for a specific deployment can override `deadline`.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

pub trait LlmAdapter: Send + Sync {
    /// Sends `prompt` to the model and returns its raw text response.
    fn complete(&self, prompt: &str) -> Result<String, NlqError>;

    fn deadline(&self) -> Duration {
        DEFAULT_DEADLINE
    }
}

/// A deterministic stand-in for a real model: looks up a canned response by
/// matching a substring of the question embedded in the prompt, falling
/// back to a fixed default. Used by demos and tests in place of a network
/// call, since nothing in this workspace makes one.
#[derive(Debug, Default)]
pub struct StaticAdapter {
    responses: HashMap<String, String>,
    default_response: String,
}

impl StaticAdapter {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self { responses: HashMap::new(), default_response: default_response.into() }
    }

    /// Registers a canned response returned whenever `prompt` contains
    /// `question_fragment`.
    pub fn with_response(mut self, question_fragment: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(question_fragment.into(), response.into());
        self
    }
}

impl LlmAdapter for StaticAdapter {
    fn complete(&self, prompt: &str) -> Result<String, NlqError> {
        for (fragment, response) in &self.responses {
            if prompt.contains(fragment.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_first_registered_fragment_found_in_the_prompt() {
        let adapter = StaticAdapter::new("default").with_response("how many", "```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```");
        let response = adapter.complete("Question: how many widgets exist?").unwrap();
        assert!(response.contains("SELECT"));
    }

    #[test]
    fn falls_back_to_the_default_response() {
        let adapter = StaticAdapter::new("default text");
        assert_eq!(adapter.complete("anything").unwrap(), "default text");
    }
}
