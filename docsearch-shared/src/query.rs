//! Typed search requests.
//!
//! A `QueryRequest` names the indices to search, how to page and sort, and a
//! single `Predicate`. It carries no engine-specific syntax; the repository
//! crate translates it into the engine's query DSL.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Operator joining the tokens of an analyzed match query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// Every token must be present.
    And,
    /// At least one token must be present.
    #[default]
    Or,
}

impl MatchOperator {
    /// The operator as the engine spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::And => "and",
            MatchOperator::Or => "or",
        }
    }
}

/// The document selection of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Any of these document identifiers.
    IdsIn { ids: Vec<String> },
    /// Exact match against the raw (non-analyzed) variant of `field`.
    ///
    /// Multi-token values only match when the index stores a raw sub-field.
    TermEquals { field: String, value: Value },
    /// Exact match of any of `values` against the raw variant of `field`.
    TermsIn { field: String, values: Vec<Value> },
    /// Every document. Scores are uniform.
    MatchAll,
    /// Analyzed match of `value` against `field`.
    MatchText {
        field: String,
        value: String,
        operator: MatchOperator,
    },
    /// Analyzed match of `value` against any of `fields`.
    MultiFieldMatch { fields: Vec<String>, value: String },
    /// Inclusive string or date range `[begin, end]`.
    RangeText {
        field: String,
        begin: String,
        end: String,
    },
    /// Numeric range with independently inclusive bounds.
    RangeNumeric {
        field: String,
        lower: Number,
        upper: Number,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },
}

/// Paging window. Zero or negative values mean "unset", not "empty page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Offset to send to the engine, if one was requested.
    pub fn offset(&self) -> Option<i64> {
        (self.offset > 0).then_some(self.offset)
    }

    /// Page size to send to the engine, if one was requested.
    pub fn limit(&self) -> Option<i64> {
        (self.limit > 0).then_some(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Single-field sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A sort string was not of the form `field,asc` or `field,desc`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid sort '{0}': expected 'field,asc' or 'field,desc'")]
pub struct SortParseError(pub String);

impl FromStr for Sort {
    type Err = SortParseError;

    /// Parses `field,asc` / `field,desc`. The direction is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let (Some(field), Some(direction), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SortParseError(s.to_string()));
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(SortParseError(s.to_string()));
        }

        match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Sort::asc(field)),
            "desc" => Ok(Sort::desc(field)),
            _ => Err(SortParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_str())
    }
}

/// A complete search request.
///
/// # Example
///
/// ```
/// use docsearch_shared::{QueryRequest, Sort};
///
/// let request = QueryRequest::term("userName", "alice")
///     .in_indices(["users"])
///     .paginate(0, 20)
///     .sorted_by(Sort::desc("age"));
///
/// assert_eq!(request.target_indices(), ["users".to_string()]);
/// assert_eq!(request.pagination.offset(), None);
/// assert_eq!(request.pagination.limit(), Some(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    target_indices: Vec<String>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub sort: Option<Sort>,
    pub predicate: Predicate,
}

impl QueryRequest {
    /// A request over all indices with default paging and relevance order.
    pub fn new(predicate: Predicate) -> Self {
        Self {
            target_indices: Vec::new(),
            pagination: Pagination::default(),
            sort: None,
            predicate,
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Predicate::IdsIn {
            ids: ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(Predicate::TermEquals {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn terms<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(Predicate::TermsIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn match_all() -> Self {
        Self::new(Predicate::MatchAll)
    }

    pub fn match_text(
        field: impl Into<String>,
        value: impl Into<String>,
        operator: MatchOperator,
    ) -> Self {
        Self::new(Predicate::MatchText {
            field: field.into(),
            value: value.into(),
            operator,
        })
    }

    pub fn multi_match<I, S>(fields: I, value: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Predicate::MultiFieldMatch {
            fields: fields.into_iter().map(Into::into).collect(),
            value: value.into(),
        })
    }

    pub fn range_text(
        field: impl Into<String>,
        begin: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self::new(Predicate::RangeText {
            field: field.into(),
            begin: begin.into(),
            end: end.into(),
        })
    }

    /// Inclusive date range, bounds rendered as RFC 3339 in UTC.
    pub fn range_dates(field: impl Into<String>, begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::range_text(
            field,
            begin.to_rfc3339_opts(SecondsFormat::Millis, true),
            end.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    pub fn range_numeric(
        field: impl Into<String>,
        lower: impl Into<Number>,
        upper: impl Into<Number>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        Self::new(Predicate::RangeNumeric {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
            lower_inclusive,
            upper_inclusive,
        })
    }

    /// Restrict the search to `indices`. Duplicates keep their first position.
    pub fn in_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_indices.clear();
        for index in indices {
            let index = index.into();
            if !self.target_indices.contains(&index) {
                self.target_indices.push(index);
            }
        }
        self
    }

    pub fn paginate(mut self, offset: i64, limit: i64) -> Self {
        self.pagination = Pagination::new(offset, limit);
        self
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Target indices in request order. Empty means every index.
    pub fn target_indices(&self) -> &[String] {
        &self.target_indices
    }
}
