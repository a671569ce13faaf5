//! OpenSearch response parsing.
//!
//! Turns raw engine responses into the crate's types. Aggregate fields the
//! caller relies on are required: a response without them is an error, never
//! a zero-filled default.

use serde_json::{Map, Value};

use docsearch_shared::{Hit, ResultEnvelope};

use crate::errors::SearchError;
use crate::types::{BulkItemResult, BulkSummary, StoredDocument, WriteOutcome, WriteResponse};

/// Normalize a `_search` response into a `ResultEnvelope`.
///
/// `hits.total`, `hits.max_score` and `hits.hits` must be present. A null
/// `max_score` (no hits, or an explicitly sorted query) stays absent.
pub fn normalize_search_response(raw: &Value) -> Result<ResultEnvelope, SearchError> {
    let hits = raw
        .get("hits")
        .and_then(Value::as_object)
        .ok_or_else(|| SearchError::parse("Search response is missing 'hits'"))?;

    let total_count = parse_total(hits.get("total"))?;

    let max_score = match hits.get("max_score") {
        None => return Err(SearchError::parse("Search response is missing 'hits.max_score'")),
        Some(Value::Null) => None,
        Some(value) => Some(parse_score(value, "hits.max_score")?),
    };

    let raw_hits = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::parse("Search response is missing 'hits.hits'"))?;

    let hits = raw_hits
        .iter()
        .map(parse_hit)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResultEnvelope {
        total_count,
        max_score,
        hits,
    })
}

/// Accepts both `{"value": n, "relation": ..}` and the legacy bare number.
fn parse_total(total: Option<&Value>) -> Result<i64, SearchError> {
    let total = total.ok_or_else(|| SearchError::parse("Search response is missing 'hits.total'"))?;

    total
        .get("value")
        .unwrap_or(total)
        .as_i64()
        .ok_or_else(|| SearchError::parse(format!("Invalid 'hits.total': {}", total)))
}

fn parse_score(value: &Value, field: &str) -> Result<f32, SearchError> {
    value
        .as_f64()
        .map(|score| score as f32)
        .ok_or_else(|| SearchError::parse(format!("Invalid '{}': {}", field, value)))
}

/// Parse a single search hit.
fn parse_hit(hit: &Value) -> Result<Hit, SearchError> {
    let document_id = required_str(hit, "_id")?;
    let index = required_str(hit, "_index")?;

    let score = match hit.get("_score") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_score(value, "_score")?),
    };

    let (body, body_text) = parse_source(hit.get("_source"))?;

    Ok(Hit {
        document_id,
        index,
        score,
        body,
        body_text,
    })
}

/// A missing source (source disabled in the mapping) yields an empty map.
fn parse_source(source: Option<&Value>) -> Result<(Map<String, Value>, String), SearchError> {
    let body = match source {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(SearchError::parse(format!(
                "Document source is not an object: {}",
                other
            )))
        }
    };
    let text = serde_json::to_string(&body)?;
    Ok((body, text))
}

fn required_str(value: &Value, field: &str) -> Result<String, SearchError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SearchError::parse(format!("Response is missing '{}'", field)))
}

fn parse_version(value: &Value) -> Option<i64> {
    value.get("_version").and_then(Value::as_i64)
}

/// Parse the response of an index, update or delete request.
pub fn parse_write_response(raw: &Value) -> Result<WriteResponse, SearchError> {
    let result = required_str(raw, "result")?;
    let outcome = WriteOutcome::parse(&result)
        .ok_or_else(|| SearchError::parse(format!("Unknown write result '{}'", result)))?;

    Ok(WriteResponse {
        index: required_str(raw, "_index")?,
        document_id: required_str(raw, "_id")?,
        version: parse_version(raw),
        outcome,
    })
}

/// Decide the outcome of a delete request from its status and body.
///
/// A 404 whose body reports `result: not_found` is a completed delete of an
/// absent document. Any other 404 means the index itself is missing.
pub fn parse_delete_response(status: u16, body: &Value) -> Result<WriteResponse, SearchError> {
    let absent_document =
        status == 404 && body.get("result").and_then(Value::as_str) == Some("not_found");

    if (200..300).contains(&status) || absent_document {
        return parse_write_response(body);
    }

    Err(SearchError::from_status(status, body.to_string()))
}

/// Parse the response of a get-document request.
pub fn parse_stored_document(raw: &Value) -> Result<StoredDocument, SearchError> {
    let index = required_str(raw, "_index")?;
    let document_id = required_str(raw, "_id")?;

    if !raw.get("found").and_then(Value::as_bool).unwrap_or(false) {
        return Err(SearchError::not_found(format!(
            "index={}, id={}",
            index, document_id
        )));
    }

    let (source, source_text) = parse_source(raw.get("_source"))?;

    Ok(StoredDocument {
        index,
        document_id,
        version: parse_version(raw),
        source,
        source_text,
    })
}

/// Read the `acknowledged` flag of an index-level operation.
pub fn parse_acknowledged(raw: &Value) -> Result<bool, SearchError> {
    raw.get("acknowledged")
        .and_then(Value::as_bool)
        .ok_or_else(|| SearchError::parse("Response is missing 'acknowledged'"))
}

/// Parse a `_bulk` response into a per-item summary.
///
/// An item fails only when it carries an `error` object; a delete of a missing
/// document reports `not_found` with status 404 and still counts as success.
pub fn parse_bulk_response(raw: &Value) -> Result<BulkSummary, SearchError> {
    let items = raw
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::parse("Bulk response is missing 'items'"))?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        // Each item is keyed by its action: {"index": {...}}, {"delete": {...}}, ...
        let detail = item
            .as_object()
            .and_then(|actions| actions.values().next())
            .ok_or_else(|| SearchError::parse(format!("Malformed bulk item: {}", item)))?;

        let raw_status = detail
            .get("status")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::parse(format!("Bulk item without status: {}", item)))?;
        let status = u16::try_from(raw_status).map_err(|_| {
            SearchError::parse(format!("Bulk item status out of range: {}", raw_status))
        })?;

        let error = detail
            .get("error")
            .map(|err| SearchError::from_status(status, err.to_string()));

        results.push(BulkItemResult {
            document_id: detail.get("_id").and_then(Value::as_str).map(str::to_string),
            status,
            success: error.is_none(),
            error,
        });
    }

    Ok(BulkSummary::from_results(results))
}
