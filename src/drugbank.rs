use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;

const DRUGBANK_URL_PATTERN: &str = r"https?://(?:[\w-]+\.)*drugbank\.(?:ca|com)/drugs/(DB[0-9]+)";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrugbankId(String);

impl DrugbankId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("DB")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrugbankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldFilter {
    Any,
    Named(&'static str),
}

impl FieldFilter {
    fn accepts(self, field: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => field == Some(name),
        }
    }
}

/// Finds the first DrugBank drug link embedded in text or in a JSON document.
///
/// JSON documents are walked depth first: object fields in document order,
/// array items in index order. Only string leaves accepted by the
/// [`FieldFilter`] are matched against the link pattern.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    url: Regex,
}

impl ReferenceExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            url: Regex::new(DRUGBANK_URL_PATTERN)
                .context("failed to compile DrugBank link regex")?,
        })
    }

    pub fn find_in_text(&self, text: &str) -> Option<DrugbankId> {
        self.url
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .find_map(|m| DrugbankId::parse(m.as_str()))
    }

    pub fn find_in_json(&self, value: &Value, filter: FieldFilter) -> Option<DrugbankId> {
        self.walk(value, None, filter)
    }

    fn walk(&self, value: &Value, field: Option<&str>, filter: FieldFilter) -> Option<DrugbankId> {
        match value {
            Value::String(text) if filter.accepts(field) => self.find_in_text(text),
            Value::Object(map) => map
                .iter()
                .find_map(|(key, child)| self.walk(child, Some(key.as_str()), filter)),
            Value::Array(items) => items
                .iter()
                .find_map(|child| self.walk(child, field, filter)),
            _ => None,
        }
    }
}
