//! In-memory search engine for tests.
//!
//! Evaluates the query bodies produced by `QueryBuilder` against fixture
//! documents and answers with engine-shaped JSON, so facade tests exercise the
//! real builder and normalizer. Text analysis is whitespace tokenizing with
//! lowercasing; `<field>.keyword` resolves to the raw string value of `<field>`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::types::{
    BulkAction, BulkItemResult, BulkSummary, StoredDocument, WriteOutcome, WriteResponse,
};

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Default)]
struct IndexState {
    docs: BTreeMap<String, (Value, i64)>,
    closed: bool,
    settings: Map<String, Value>,
}

#[derive(Default)]
struct State {
    indices: BTreeMap<String, IndexState>,
    templates: BTreeMap<String, Value>,
    next_id: u64,
}

/// A `SearchEngineClient` backed by in-process maps.
#[derive(Default)]
pub(crate) struct InMemoryEngine {
    state: Mutex<State>,
    failure: Option<SearchError>,
    searches: Mutex<Vec<(Vec<String>, Value)>>,
}

impl InMemoryEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// An engine on which every call fails with `error`.
    pub(crate) fn failing(error: SearchError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub(crate) fn with_index(mut self, index: &str) -> Self {
        self.state
            .get_mut()
            .indices
            .entry(index.to_string())
            .or_default();
        self
    }

    pub(crate) fn with_document(mut self, index: &str, id: &str, source: Value) -> Self {
        self.state
            .get_mut()
            .indices
            .entry(index.to_string())
            .or_default()
            .docs
            .insert(id.to_string(), (source, 1));
        self
    }

    /// The target indices and body of the most recent search.
    pub(crate) async fn last_search(&self) -> Option<(Vec<String>, Value)> {
        self.searches.lock().await.last().cloned()
    }

    pub(crate) async fn index_settings(&self, index: &str) -> Option<Map<String, Value>> {
        let state = self.state.lock().await;
        state.indices.get(index).map(|i| i.settings.clone())
    }

    pub(crate) async fn template(&self, name: &str) -> Option<Value> {
        self.state.lock().await.templates.get(name).cloned()
    }

    fn check_failure(&self) -> Result<(), SearchError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn open_entry<'a>(
        state: &'a mut State,
        index: &str,
    ) -> Result<&'a mut IndexState, SearchError> {
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(format!("no such index [{}]", index)))?;
        if entry.closed {
            return Err(SearchError::from_status(400, format!("index [{}] is closed", index)));
        }
        Ok(entry)
    }

    fn write_index(
        state: &mut State,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> Result<WriteResponse, SearchError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                state.next_id += 1;
                format!("auto-{}", state.next_id)
            }
        };
        let entry = state.indices.entry(index.to_string()).or_default();
        if entry.closed {
            return Err(SearchError::from_status(400, format!("index [{}] is closed", index)));
        }

        let (outcome, version) = match entry.docs.get(&id) {
            Some((_, version)) => (WriteOutcome::Updated, version + 1),
            None => (WriteOutcome::Created, 1),
        };
        entry.docs.insert(id.clone(), (source.clone(), version));

        Ok(WriteResponse {
            index: index.to_string(),
            document_id: id,
            version: Some(version),
            outcome,
        })
    }

    fn write_update(
        state: &mut State,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<WriteResponse, SearchError> {
        let entry = Self::open_entry(state, index)?;
        let (source, version) = entry
            .docs
            .get_mut(id)
            .ok_or_else(|| SearchError::not_found(format!("[{}]: document missing", id)))?;

        let mut merged = source.clone();
        if let (Some(target), Some(patch)) = (merged.as_object_mut(), doc.as_object()) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }

        let outcome = if merged == *source {
            WriteOutcome::Noop
        } else {
            *source = merged;
            *version += 1;
            WriteOutcome::Updated
        };

        Ok(WriteResponse {
            index: index.to_string(),
            document_id: id.to_string(),
            version: Some(*version),
            outcome,
        })
    }

    fn write_delete(
        state: &mut State,
        index: &str,
        id: &str,
    ) -> Result<WriteResponse, SearchError> {
        let entry = Self::open_entry(state, index)?;
        let (outcome, version) = match entry.docs.remove(id) {
            Some((_, version)) => (WriteOutcome::Deleted, Some(version + 1)),
            None => (WriteOutcome::NotFound, None),
        };

        Ok(WriteResponse {
            index: index.to_string(),
            document_id: id.to_string(),
            version,
            outcome,
        })
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Resolve `field` in `source`, treating `<field>.keyword` as the raw string.
fn field_value<'a>(source: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(value) = source.get(field) {
        return Some(value);
    }
    let base = field.strip_suffix(".keyword")?;
    source.get(base).filter(|value| value.is_string())
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn in_range(value: &Value, bounds: &Value) -> bool {
    let check = |op: &str, accept: fn(Ordering) -> bool| match bounds.get(op) {
        None => true,
        Some(bound) => compare(value, bound).map(accept).unwrap_or(false),
    };

    check("gte", |o| o != Ordering::Less)
        && check("gt", |o| o == Ordering::Greater)
        && check("lte", |o| o != Ordering::Greater)
        && check("lt", |o| o == Ordering::Less)
}

fn text_matches(source: &Value, field: &str, query: &[String]) -> usize {
    let Some(text) = field_value(source, field).and_then(Value::as_str) else {
        return 0;
    };
    let doc_tokens = tokens(text);
    query.iter().filter(|token| doc_tokens.contains(token)).count()
}

fn single_entry(clause: &Value) -> Option<(&String, &Value)> {
    clause.as_object().and_then(|map| map.iter().next())
}

/// Score `source` against a query clause; `None` when it does not match.
fn evaluate(query: &Value, id: &str, source: &Value) -> Option<f32> {
    let (kind, clause) = single_entry(query)?;
    match kind.as_str() {
        "match_all" => Some(1.0),
        "ids" => clause["values"]
            .as_array()?
            .iter()
            .any(|value| value.as_str() == Some(id))
            .then_some(1.0),
        "term" => {
            let (field, expected) = single_entry(clause)?;
            (field_value(source, field)? == expected).then_some(1.0)
        }
        "terms" => {
            let (field, expected) = single_entry(clause)?;
            let actual = field_value(source, field)?;
            expected.as_array()?.contains(actual).then_some(1.0)
        }
        "match" => {
            let (field, options) = single_entry(clause)?;
            let query = tokens(options["query"].as_str()?);
            let matched = text_matches(source, field, &query);
            let required = if options["operator"] == "and" {
                query.len()
            } else {
                1
            };
            (matched > 0 && matched >= required).then_some(matched as f32)
        }
        "multi_match" => {
            let query = tokens(clause["query"].as_str()?);
            let matched: usize = clause["fields"]
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(|field| text_matches(source, field, &query))
                .sum();
            (matched > 0).then_some(matched as f32)
        }
        "range" => {
            let (field, bounds) = single_entry(clause)?;
            in_range(field_value(source, field)?, bounds).then_some(1.0)
        }
        _ => None,
    }
}

#[async_trait]
impl SearchEngineClient for InMemoryEngine {
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        if state.indices.contains_key(index) {
            return Err(SearchError::from_status(
                400,
                format!("resource_already_exists_exception: [{}]", index),
            ));
        }

        let settings = body
            .get("settings")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        state.indices.insert(
            index.to_string(),
            IndexState {
                settings,
                ..IndexState::default()
            },
        );
        Ok(true)
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        state
            .indices
            .remove(index)
            .map(|_| true)
            .ok_or_else(|| SearchError::not_found(format!("no such index [{}]", index)))
    }

    async fn index_exists(&self, indices: &[&str]) -> Result<bool, SearchError> {
        self.check_failure()?;
        let state = self.state.lock().await;
        Ok(indices.iter().all(|index| state.indices.contains_key(*index)))
    }

    async fn open_index(&self, index: &str) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(format!("no such index [{}]", index)))?;
        entry.closed = false;
        Ok(true)
    }

    async fn close_index(&self, index: &str) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(format!("no such index [{}]", index)))?;
        entry.closed = true;
        Ok(true)
    }

    async fn put_index_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        let entry = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(format!("no such index [{}]", index)))?;
        if let Some(settings) = settings.as_object() {
            for (key, value) in settings {
                entry.settings.insert(key.clone(), value.clone());
            }
        }
        Ok(true)
    }

    async fn put_index_template(&self, name: &str, body: &Value) -> Result<bool, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        state.templates.insert(name.to_string(), body.clone());
        Ok(true)
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> Result<WriteResponse, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        Self::write_index(&mut state, index, id, source)
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<StoredDocument, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        let entry = Self::open_entry(&mut state, index)?;
        let (source, version) = entry
            .docs
            .get(id)
            .ok_or_else(|| SearchError::not_found(format!("index={}, id={}", index, id)))?;

        let source = source.as_object().cloned().unwrap_or_default();
        Ok(StoredDocument {
            index: index.to_string(),
            document_id: id.to_string(),
            version: Some(*version),
            source_text: serde_json::to_string(&source)?,
            source,
        })
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        self.check_failure()?;
        let state = self.state.lock().await;
        Ok(state
            .indices
            .get(index)
            .is_some_and(|entry| entry.docs.contains_key(id)))
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<WriteResponse, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        Self::write_update(&mut state, index, id, doc)
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<WriteResponse, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        Self::write_delete(&mut state, index, id)
    }

    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> Result<BulkSummary, SearchError> {
        self.check_failure()?;
        let mut state = self.state.lock().await;
        state.indices.entry(index.to_string()).or_default();

        let results = actions
            .iter()
            .map(|action| {
                let result = match action {
                    BulkAction::Index { id, source } => {
                        Self::write_index(&mut state, index, id.as_deref(), source)
                    }
                    BulkAction::Update { id, doc } => {
                        Self::write_update(&mut state, index, id, doc)
                    }
                    BulkAction::Delete { id } => Self::write_delete(&mut state, index, id),
                };
                match result {
                    Ok(written) => BulkItemResult {
                        status: match written.outcome {
                            WriteOutcome::Created => 201,
                            WriteOutcome::NotFound => 404,
                            _ => 200,
                        },
                        document_id: Some(written.document_id),
                        success: true,
                        error: None,
                    },
                    Err(error) => BulkItemResult {
                        document_id: action.id().map(str::to_string),
                        status: if error.is_not_found() { 404 } else { 400 },
                        success: false,
                        error: Some(error),
                    },
                }
            })
            .collect();

        Ok(BulkSummary::from_results(results))
    }

    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError> {
        self.check_failure()?;
        self.searches
            .lock()
            .await
            .push((indices.to_vec(), body.clone()));

        let mut state = self.state.lock().await;
        let mut targets: Vec<String> = Vec::new();
        for pattern in indices {
            if pattern == "_all" {
                targets.extend(state.indices.keys().cloned());
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                targets.extend(
                    state
                        .indices
                        .keys()
                        .filter(|name| name.starts_with(prefix))
                        .cloned(),
                );
            } else {
                targets.push(pattern.clone());
            }
        }
        if indices.is_empty() {
            targets.extend(state.indices.keys().cloned());
        }

        let query = &body["query"];
        let mut matched: Vec<(String, String, Value, f32)> = Vec::new();
        for index in &targets {
            let entry = Self::open_entry(&mut state, index)?;
            for (id, (source, _)) in &entry.docs {
                if let Some(score) = evaluate(query, id, source) {
                    matched.push((index.clone(), id.clone(), source.clone(), score));
                }
            }
        }

        let sort = body
            .get("sort")
            .and_then(Value::as_array)
            .and_then(|sorts| sorts.first())
            .and_then(single_entry)
            .map(|(field, options)| (field.clone(), options["order"] == "desc"));

        match &sort {
            Some((field, descending)) => matched.sort_by(|a, b| {
                let ordering = match (a.2.get(field), b.2.get(field)) {
                    (Some(l), Some(r)) => compare(l, r).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            }),
            None => matched.sort_by(|a, b| {
                b.3.partial_cmp(&a.3)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.1.cmp(&b.1))
            }),
        }

        let total = matched.len();
        let scored = sort.is_none();
        let max_score = if scored {
            matched
                .iter()
                .map(|m| m.3)
                .fold(None, |max: Option<f32>, s| Some(max.map_or(s, |m| m.max(s))))
        } else {
            None
        };

        let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
        let size = body
            .get("size")
            .and_then(Value::as_u64)
            .map(|s| s as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let hits: Vec<Value> = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(index, id, source, score)| {
                let score = if scored { json!(score) } else { Value::Null };
                json!({
                    "_index": index,
                    "_id": id,
                    "_score": score,
                    "_source": source,
                })
            })
            .collect();

        Ok(json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": { "value": total, "relation": "eq" },
                "max_score": max_score,
                "hits": hits,
            }
        }))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        self.check_failure()?;
        Ok(true)
    }
}
