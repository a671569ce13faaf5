//! OpenSearch query builders.
//!
//! This module turns a `QueryRequest` into the search body accepted by the
//! `_search` endpoint. Building is pure and infallible: every well-typed
//! request has a body, and any rejection happens when the body is sent.

use serde_json::{json, Map, Value};

use docsearch_shared::{Predicate, QueryRequest};

/// Where exact-match (`term`/`terms`) predicates look for the non-analyzed
/// variant of a field.
///
/// Analyzed text fields are tokenized, so an exact match needs a parallel raw
/// field. With `SubField("keyword")` the index mapping must declare a
/// `keyword` sub-field on every text field queried this way (the engine's
/// dynamic mapping does this by default); see
/// [`IndexSettings::text_with_raw`](crate::opensearch::IndexSettings::text_with_raw).
/// Use `Direct` when the queried fields are already `keyword` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFieldMapping {
    /// Query `<field>.<name>`.
    SubField(String),
    /// Query the field itself.
    Direct,
}

impl Default for RawFieldMapping {
    fn default() -> Self {
        Self::SubField("keyword".to_string())
    }
}

impl RawFieldMapping {
    /// The field name exact-match predicates should target.
    pub fn resolve(&self, field: &str) -> String {
        match self {
            RawFieldMapping::SubField(name) => format!("{}.{}", field, name),
            RawFieldMapping::Direct => field.to_string(),
        }
    }
}

/// Builds search bodies from typed requests.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    raw_fields: RawFieldMapping,
}

impl QueryBuilder {
    pub fn new(raw_fields: RawFieldMapping) -> Self {
        Self { raw_fields }
    }

    /// Build the full search body: query, paging and sort.
    ///
    /// `from` and `size` are only emitted when positive, so an unset window
    /// leaves the engine's defaults in place.
    pub fn build(&self, request: &QueryRequest) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.build_predicate(&request.predicate));

        if let Some(offset) = request.pagination.offset() {
            body.insert("from".to_string(), json!(offset));
        }
        if let Some(limit) = request.pagination.limit() {
            body.insert("size".to_string(), json!(limit));
        }

        if let Some(sort) = &request.sort {
            body.insert(
                "sort".to_string(),
                json!([{ sort.field.as_str(): { "order": sort.direction.as_str() } }]),
            );
        }

        Value::Object(body)
    }

    /// Build the query clause for a single predicate.
    pub fn build_predicate(&self, predicate: &Predicate) -> Value {
        match predicate {
            Predicate::IdsIn { ids } => json!({ "ids": { "values": ids } }),
            Predicate::TermEquals { field, value } => {
                json!({ "term": { self.raw_fields.resolve(field): value } })
            }
            Predicate::TermsIn { field, values } => {
                json!({ "terms": { self.raw_fields.resolve(field): values } })
            }
            Predicate::MatchAll => json!({ "match_all": {} }),
            Predicate::MatchText {
                field,
                value,
                operator,
            } => json!({
                "match": {
                    field.as_str(): {
                        "query": value,
                        "operator": operator.as_str()
                    }
                }
            }),
            Predicate::MultiFieldMatch { fields, value } => json!({
                "multi_match": {
                    "query": value,
                    "fields": fields
                }
            }),
            Predicate::RangeText { field, begin, end } => json!({
                "range": {
                    field.as_str(): { "gte": begin, "lte": end }
                }
            }),
            Predicate::RangeNumeric {
                field,
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => {
                let bounds = match (*lower_inclusive, *upper_inclusive) {
                    (true, true) => json!({ "gte": lower, "lte": upper }),
                    (true, false) => json!({ "gte": lower, "lt": upper }),
                    (false, true) => json!({ "gt": lower, "lte": upper }),
                    (false, false) => json!({ "gt": lower, "lt": upper }),
                };
                json!({ "range": { field.as_str(): bounds } })
            }
        }
    }
}
