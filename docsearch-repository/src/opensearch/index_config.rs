//! OpenSearch index settings, mappings and templates.
//!
//! Index names must be lowercase; the engine rejects anything else, so the
//! check happens before a request is sent.

use serde_json::{json, Map, Value};

use crate::errors::SearchError;

/// Settings and mappings for a new index.
///
/// Everything is optional; an empty `IndexSettings` creates the index with the
/// engine defaults and dynamic mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSettings {
    pub number_of_shards: Option<u32>,
    pub number_of_replicas: Option<u32>,
    /// Field mappings, keyed by field name.
    pub properties: Map<String, Value>,
}

impl IndexSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shards(mut self, shards: u32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Map `field` with an explicit mapping object.
    pub fn field(mut self, field: impl Into<String>, mapping: Value) -> Self {
        self.properties.insert(field.into(), mapping);
        self
    }

    /// Map `field` as analyzed text with a `keyword` sub-field named `raw_name`.
    ///
    /// Exact-match predicates built with `RawFieldMapping::SubField(raw_name)`
    /// need this sub-field to exist.
    pub fn text_with_raw(self, field: impl Into<String>, raw_name: &str) -> Self {
        self.field(
            field,
            json!({
                "type": "text",
                "fields": {
                    raw_name: { "type": "keyword", "ignore_above": 256 }
                }
            }),
        )
    }

    /// Map `field` as a keyword, matched exactly without a sub-field.
    pub fn keyword(self, field: impl Into<String>) -> Self {
        self.field(field, json!({ "type": "keyword" }))
    }

    /// The `settings` object, if any setting is given.
    fn settings_json(&self) -> Option<Value> {
        let mut settings = Map::new();
        if let Some(shards) = self.number_of_shards {
            settings.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            settings.insert("number_of_replicas".to_string(), json!(replicas));
        }
        (!settings.is_empty()).then_some(Value::Object(settings))
    }

    /// The create-index request body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(settings) = self.settings_json() {
            body.insert("settings".to_string(), settings);
        }
        if !self.properties.is_empty() {
            body.insert(
                "mappings".to_string(),
                json!({ "properties": self.properties }),
            );
        }
        Value::Object(body)
    }
}

/// A legacy index template applied to indices whose names match `patterns`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTemplate {
    pub name: String,
    pub patterns: Vec<String>,
    pub settings: IndexSettings,
}

impl IndexTemplate {
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            settings: IndexSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The put-template request body.
    pub fn to_body(&self) -> Value {
        let mut body = match self.settings.to_body() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("index_patterns".to_string(), json!(self.patterns));
        Value::Object(body)
    }
}

/// Check an index name against the engine's naming rules.
pub fn validate_index_name(name: &str) -> Result<(), SearchError> {
    if name.is_empty() {
        return Err(SearchError::validation("index name is required"));
    }
    if name == "." || name == ".." {
        return Err(SearchError::validation(format!("invalid index name '{}'", name)));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(SearchError::validation(format!(
            "index name '{}' must not start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchError::validation(format!(
            "index name '{}' must be lowercase",
            name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| {
            matches!(
                c,
                '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' | ',' | '#' | ':'
            )
        })
    {
        return Err(SearchError::validation(format!(
            "index name '{}' contains illegal character '{}'",
            name, c
        )));
    }
    Ok(())
}
