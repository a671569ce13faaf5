//! # Docsearch Shared
//!
//! Request and result types shared between the search facade and its callers.
//! Everything here is transient: a `QueryRequest` is built per call and a
//! `ResultEnvelope` is returned per call.

mod query;
mod result;

pub use query::{
    MatchOperator, Pagination, Predicate, QueryRequest, Sort, SortDirection, SortParseError,
};
pub use result::{Hit, ResultEnvelope};
