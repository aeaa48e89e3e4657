//! Session language tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Language of a conversation.
///
/// `code` is the lowercase tag stored in the knowledge base metadata and used
/// as the retrieval filter value; `name` is the language the model is asked
/// to answer in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    /// Create a language from a tag and its human-readable name.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into().to_lowercase(),
            name: name.into(),
        }
    }

    pub fn dutch() -> Self {
        Self::new("nl", "dutch")
    }

    pub fn english() -> Self {
        Self::new("en", "english")
    }

    /// Uppercase tag as shown to users (e.g. "NL").
    pub fn tag(&self) -> String {
        self.code.to_uppercase()
    }

    pub fn is_english(&self) -> bool {
        self.code == "en"
    }

    /// Resolve a tag against the built-in languages and any extra ones.
    pub fn resolve(tag: &str, extra: &[Language]) -> Result<Self, AppError> {
        if let Ok(lang) = tag.parse() {
            return Ok(lang);
        }

        extra
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(tag) || l.name.eq_ignore_ascii_case(tag))
            .cloned()
            .ok_or_else(|| AppError::Config(format!("Unknown language: {}", tag)))
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::dutch()
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nl" | "dutch" | "nederlands" => Ok(Self::dutch()),
            "en" | "english" => Ok(Self::english()),
            other => Err(AppError::Config(format!("Unknown language: {}", other))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
