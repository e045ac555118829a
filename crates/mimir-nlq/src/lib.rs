//! Natural-language querying over a loaded ontology's graph (§4.14):
//! `LlmAdapter` is the model-call contract, `NLQueryMediator` drives
//! prompt construction, SPARQL extraction, validation with one retry, and
//! a TTL-bounded cache of successful translations.

pub mod adapter;
pub mod cache;
pub mod errors;
pub mod mediator;
pub mod prompt;

pub use adapter::{LlmAdapter, StaticAdapter, DEFAULT_DEADLINE};
pub use cache::QueryCache;
pub use errors::NlqError;
pub use mediator::NLQueryMediator;
pub use prompt::{build_prompt, extract_sparql};
