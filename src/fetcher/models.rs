//! Wire models for the random fact API

use crate::facts::Fact;
use serde::Deserialize;

/// Body returned by `GET /api/v2/facts/random`.
///
/// Only `text` and `source_url` are read; other fields are ignored. Both are
/// optional here so a missing field is reported by name instead of as a
/// generic decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomFactResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RandomFactResponse {
    /// Convert into a [`Fact`], naming the first missing required field
    pub fn into_fact(self) -> Result<Fact, &'static str> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or("text")?;
        let source = self.source_url.ok_or("source_url")?;
        Ok(Fact { text, source })
    }
}
