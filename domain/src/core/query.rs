//! Query value object

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The user query fanned out to every model (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    content: String,
}

impl Query {
    /// Create a query, rejecting empty or whitespace-only text
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(DomainError::EmptyQuery)
        } else {
            Ok(Self { content })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::try_new("What is Rust?").unwrap();
        assert_eq!(q.content(), "What is Rust?");
    }

    #[test]
    fn test_try_new_empty() {
        assert_eq!(Query::try_new(""), Err(DomainError::EmptyQuery));
        assert_eq!(Query::try_new("   "), Err(DomainError::EmptyQuery));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let q = Query::try_new("hello").unwrap();
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"hello\"");
    }
}
