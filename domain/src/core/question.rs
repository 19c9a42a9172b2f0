//! Question value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// The user's question that seeds a roundtable (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a question, rejecting empty or whitespace-only content
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content: content.trim().to_string(),
        })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Short single-line form used for workspace names and headings
    pub fn summary(&self, max_chars: usize) -> String {
        let first_line = self.content.lines().next().unwrap_or_default().trim();
        if first_line.chars().count() <= max_chars {
            first_line.to_string()
        } else {
            let cut: String = first_line.chars().take(max_chars).collect();
            format!("{}...", cut.trim_end())
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
