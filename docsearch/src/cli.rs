//! Command-line surface over the search facade.
//!
//! Every command maps onto one `SearchIndexClient` operation and produces a
//! JSON value for the caller to print.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Number, Value};
use tracing::info;

use crate::AppError;
use docsearch_repository::{IndexSettings, IndexTemplate, RawFieldMapping, SearchIndexClient};
use docsearch_shared::{MatchOperator, QueryRequest, Sort};

#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(
    about = "Search and manage documents in an Elasticsearch-compatible engine",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Skip the startup health check
    #[arg(long, global = true)]
    pub no_health_check: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report whether the cluster is green or yellow
    Health,
    /// Create an index
    CreateIndex {
        index: String,
        #[arg(long)]
        shards: Option<u32>,
        #[arg(long)]
        replicas: Option<u32>,
        /// Text field to map with a raw keyword sub-field (repeatable)
        #[arg(long = "text-field")]
        text_fields: Vec<String>,
        /// Field to map as a keyword (repeatable)
        #[arg(long = "keyword-field")]
        keyword_fields: Vec<String>,
    },
    /// Delete an index
    DeleteIndex { index: String },
    /// Check that every listed index exists
    IndexExists {
        #[arg(required = true)]
        indices: Vec<String>,
    },
    /// Open a closed index
    OpenIndex { index: String },
    /// Close an index
    CloseIndex { index: String },
    /// Update index settings from a JSON object
    UpdateSettings { index: String, settings: String },
    /// Register an index template
    PutTemplate {
        name: String,
        /// Index name pattern (repeatable)
        #[arg(long = "pattern", required = true)]
        patterns: Vec<String>,
        #[arg(long)]
        shards: Option<u32>,
        #[arg(long)]
        replicas: Option<u32>,
    },
    /// Index a JSON document
    Index {
        index: String,
        document: String,
        /// Document id; generated by the engine when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Fetch a document
    Get { index: String, id: String },
    /// Check whether a document exists
    Exists { index: String, id: String },
    /// Merge a JSON object into a document
    Update {
        index: String,
        id: String,
        document: String,
    },
    /// Delete a document
    Delete { index: String, id: String },
    /// Index newline-delimited JSON documents from a file
    BulkIndex {
        index: String,
        file: PathBuf,
        /// Take each document's id from this field
        #[arg(long)]
        id_field: Option<String>,
    },
    /// Delete several documents
    BulkDelete {
        index: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Run a search
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Index to search (repeatable); all indices when omitted
    #[arg(long = "index")]
    pub indices: Vec<String>,

    /// Offset of the first hit; ignored unless positive
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub from: i64,

    /// Page size; the engine default applies unless positive
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub size: i64,

    /// Sort as `field,asc` or `field,desc`
    #[arg(long)]
    pub sort: Option<Sort>,

    #[command(subcommand)]
    pub predicate: PredicateCommand,
}

#[derive(Subcommand, Debug)]
pub enum PredicateCommand {
    /// Documents with any of the given ids
    Ids {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Exact match on a field's raw value
    Term { field: String, value: String },
    /// Exact match on any of several raw values
    Terms {
        field: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Every document
    MatchAll,
    /// Analyzed text match
    Match {
        field: String,
        value: String,
        /// Require every term instead of any
        #[arg(long)]
        and: bool,
    },
    /// Analyzed text match across several fields
    MultiMatch {
        value: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Inclusive string or date range
    RangeText {
        field: String,
        begin: String,
        end: String,
    },
    /// Numeric range, inclusive unless told otherwise
    RangeNum {
        field: String,
        #[arg(allow_negative_numbers = true)]
        lower: Number,
        #[arg(allow_negative_numbers = true)]
        upper: Number,
        #[arg(long)]
        exclusive_lower: bool,
        #[arg(long)]
        exclusive_upper: bool,
    },
}

impl Command {
    /// Whether the command should run without the startup health check.
    pub fn skips_health_check(&self) -> bool {
        matches!(self, Command::Health)
    }
}

impl SearchArgs {
    pub fn to_request(&self) -> QueryRequest {
        let request = match &self.predicate {
            PredicateCommand::Ids { ids } => QueryRequest::ids(ids.clone()),
            PredicateCommand::Term { field, value } => {
                QueryRequest::term(field.as_str(), parse_scalar(value))
            }
            PredicateCommand::Terms { field, values } => {
                QueryRequest::terms(field.as_str(), values.iter().map(|v| parse_scalar(v)))
            }
            PredicateCommand::MatchAll => QueryRequest::match_all(),
            PredicateCommand::Match { field, value, and } => {
                let operator = if *and {
                    MatchOperator::And
                } else {
                    MatchOperator::Or
                };
                QueryRequest::match_text(field.as_str(), value.as_str(), operator)
            }
            PredicateCommand::MultiMatch { value, fields } => {
                QueryRequest::multi_match(fields.clone(), value.as_str())
            }
            PredicateCommand::RangeText { field, begin, end } => {
                QueryRequest::range_text(field.as_str(), begin.as_str(), end.as_str())
            }
            PredicateCommand::RangeNum {
                field,
                lower,
                upper,
                exclusive_lower,
                exclusive_upper,
            } => QueryRequest::range_numeric(
                field.as_str(),
                lower.clone(),
                upper.clone(),
                !exclusive_lower,
                !exclusive_upper,
            ),
        };

        let request = request
            .in_indices(self.indices.iter().map(String::as_str))
            .paginate(self.from, self.size);
        match &self.sort {
            Some(sort) => request.sorted_by(sort.clone()),
            None => request,
        }
    }
}

/// Numbers and booleans are passed as such; anything else is a string.
fn parse_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn parse_object(raw: &str) -> Result<Value, AppError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(AppError::input("expected a JSON object"));
    }
    Ok(value)
}

fn settings_from(shards: Option<u32>, replicas: Option<u32>) -> IndexSettings {
    let mut settings = IndexSettings::new();
    settings.number_of_shards = shards;
    settings.number_of_replicas = replicas;
    settings
}

/// Read newline-delimited JSON, skipping blank lines.
fn read_documents(file: &Path) -> Result<Vec<Value>, AppError> {
    fs::read_to_string(file)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_object)
        .collect()
}

/// Run `command` against `client` and return its JSON output.
pub async fn run(command: Command, client: &SearchIndexClient) -> Result<Value, AppError> {
    let output = match command {
        Command::Health => json!({ "healthy": client.health_check().await? }),
        Command::CreateIndex {
            index,
            shards,
            replicas,
            text_fields,
            keyword_fields,
        } => {
            let raw_name = match &client.config().raw_fields {
                RawFieldMapping::SubField(name) => Some(name.clone()),
                RawFieldMapping::Direct => None,
            };
            let mut settings = settings_from(shards, replicas);
            for field in text_fields {
                settings = match &raw_name {
                    Some(name) => settings.text_with_raw(field, name),
                    None => settings.keyword(field),
                };
            }
            for field in keyword_fields {
                settings = settings.keyword(field);
            }
            json!({ "acknowledged": client.create_index(&index, &settings).await? })
        }
        Command::DeleteIndex { index } => {
            json!({ "acknowledged": client.delete_index(&index).await? })
        }
        Command::IndexExists { indices } => {
            let indices: Vec<&str> = indices.iter().map(String::as_str).collect();
            json!({ "exists": client.index_exists(&indices).await? })
        }
        Command::OpenIndex { index } => json!({ "acknowledged": client.open_index(&index).await? }),
        Command::CloseIndex { index } => {
            json!({ "acknowledged": client.close_index(&index).await? })
        }
        Command::UpdateSettings { index, settings } => {
            let settings = parse_object(&settings)?;
            json!({ "acknowledged": client.update_index_settings(&index, &settings).await? })
        }
        Command::PutTemplate {
            name,
            patterns,
            shards,
            replicas,
        } => {
            let template =
                IndexTemplate::new(name, patterns).with_settings(settings_from(shards, replicas));
            json!({ "acknowledged": client.put_index_template(&template).await? })
        }
        Command::Index {
            index,
            document,
            id,
        } => {
            let document = parse_object(&document)?;
            let response = client
                .index_document(&index, id.as_deref(), &document)
                .await?;
            serde_json::to_value(response)?
        }
        Command::Get { index, id } => {
            serde_json::to_value(client.get_document(&index, &id).await?)?
        }
        Command::Exists { index, id } => {
            json!({ "exists": client.document_exists(&index, &id).await? })
        }
        Command::Update {
            index,
            id,
            document,
        } => {
            let document = parse_object(&document)?;
            serde_json::to_value(client.update_document(&index, &id, &document).await?)?
        }
        Command::Delete { index, id } => {
            serde_json::to_value(client.delete_document(&index, &id).await?)?
        }
        Command::BulkIndex {
            index,
            file,
            id_field,
        } => {
            let documents = read_documents(&file)?;
            info!(index = %index, count = documents.len(), "Bulk indexing documents");
            let summary = match id_field {
                Some(field) => {
                    let documents = documents
                        .into_iter()
                        .map(|document| {
                            let id = match document.get(&field) {
                                Some(Value::String(id)) => id.clone(),
                                Some(Value::Number(id)) => id.to_string(),
                                _ => {
                                    return Err(AppError::input(format!(
                                        "document has no '{}' id field",
                                        field
                                    )))
                                }
                            };
                            Ok((id, document))
                        })
                        .collect::<Result<Vec<_>, AppError>>()?;
                    client.bulk_index_with_ids(&index, &documents).await?
                }
                None => client.bulk_index(&index, &documents).await?,
            };
            summary.to_json()
        }
        Command::BulkDelete { index, ids } => client.bulk_delete(&index, &ids).await?.to_json(),
        Command::Search(args) => serde_json::to_value(client.search(&args.to_request()).await?)?,
    };
    Ok(output)
}
