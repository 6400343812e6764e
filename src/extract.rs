use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::errors::EvalError;

pub const DEFAULT_OPEN_TAG: &str = "<tool_call>";
pub const DEFAULT_CLOSE_TAG: &str = "</tool_call>";

/// Open/close markers around a tool-call block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagPair {
    pub open: String,
    pub close: String,
}

impl Default for TagPair {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_TAG.to_string(),
            close: DEFAULT_CLOSE_TAG.to_string(),
        }
    }
}

impl TagPair {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.open == DEFAULT_OPEN_TAG && self.close == DEFAULT_CLOSE_TAG
    }

    /// Wrap `body` in this tag pair, one block per line group.
    pub fn wrap(&self, body: &str) -> String {
        format!("{}\n{}\n{}\n", self.open, body, self.close)
    }

    fn pattern(&self) -> String {
        format!(
            "(?s){}(.*?){}",
            regex::escape(&self.open),
            regex::escape(&self.close)
        )
    }
}

/// Finds delimited candidate blocks in generated text.
#[derive(Debug, Clone)]
pub struct Extractor {
    tags: TagPair,
    block_re: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        static DEFAULT_RE: OnceLock<Regex> = OnceLock::new();
        let tags = TagPair::default();
        let block_re = DEFAULT_RE
            .get_or_init(|| Regex::new(&tags.pattern()).expect("tool_call regex"))
            .clone();
        Self { tags, block_re }
    }
}

impl Extractor {
    pub fn new(tags: TagPair) -> Result<Self, EvalError> {
        if tags.is_default() {
            return Ok(Self::default());
        }
        if tags.open.is_empty() || tags.close.is_empty() {
            return Err(EvalError::InvalidTags(
                "open and close tags must not be empty".to_string(),
            ));
        }
        let block_re = Regex::new(&tags.pattern())?;
        Ok(Self { tags, block_re })
    }

    pub fn tags(&self) -> &TagPair {
        &self.tags
    }

    /// Contents of every block in order of appearance. Matching is non-greedy and
    /// non-overlapping; an empty result means the text holds no tool calls.
    pub fn extract<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.block_re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

/// Extract blocks with the default `<tool_call>` tags.
pub fn extract_blocks(text: &str) -> Vec<&str> {
    Extractor::default().extract(text)
}
