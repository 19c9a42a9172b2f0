//! Prompt domain
//!
//! Templates for every agent call in the roundtable flow.

mod template;

pub use template::PromptTemplate;
