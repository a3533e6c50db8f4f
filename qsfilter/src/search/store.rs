//! RediSearch execution of composed queries.
//!
//! Documents are stored as RedisJSON. Temporal attributes must be stored as
//! epoch milliseconds so they can be indexed as NUMERIC.

use std::borrow::Cow;

use redis::{Value, aio::ConnectionManager, cmd, from_redis_value};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use super::{SearchParams, TAG_SEPARATOR};
use crate::errors::StoreError;
use crate::schema::{FieldKind, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFieldType {
    Tag,
    Text,
    Numeric,
}

impl IndexFieldType {
    pub const fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Boolean | FieldKind::List => IndexFieldType::Tag,
            FieldKind::Numeric | FieldKind::Temporal => IndexFieldType::Numeric,
            FieldKind::Text => IndexFieldType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub path: String,
    pub field_name: String,
    pub field_type: IndexFieldType,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub prefixes: Vec<String>,
    pub schema: Vec<IndexField>,
}

impl IndexDefinition {
    /// Index every stored, filterable or sortable field of `schema`.
    ///
    /// Fields are indexed under their target attribute so rendered queries
    /// address them directly. Computed fields have no stored value and are skipped.
    pub fn from_schema(name: impl Into<String>, prefixes: Vec<String>, schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .filter(|field| (field.filterable || field.sortable) && !field.is_computed())
            .map(|field| {
                let target = field.target();
                let path = match field.kind {
                    FieldKind::List => format!("$.{target}[*]"),
                    _ => format!("$.{target}"),
                };
                IndexField {
                    path,
                    field_name: target.to_string(),
                    field_type: IndexFieldType::for_kind(field.kind),
                    sortable: field.sortable,
                }
            })
            .collect();
        Self {
            name: name.into(),
            prefixes,
            schema: fields,
        }
    }

    /// Arguments of the `FT.CREATE` command for this definition.
    pub fn create_args(&self) -> Vec<String> {
        let mut args = vec![self.name.clone(), "ON".to_string(), "JSON".to_string()];
        args.push("PREFIX".to_string());
        args.push(self.prefixes.len().to_string());
        args.extend(self.prefixes.iter().cloned());
        args.push("SCHEMA".to_string());
        for field in &self.schema {
            args.push(field.path.clone());
            args.push("AS".to_string());
            args.push(field.field_name.clone());
            match field.field_type {
                IndexFieldType::Tag => {
                    args.push("TAG".to_string());
                    args.push("SEPARATOR".to_string());
                    args.push(TAG_SEPARATOR.to_string());
                }
                IndexFieldType::Text => args.push("TEXT".to_string()),
                IndexFieldType::Numeric => args.push("NUMERIC".to_string()),
            }
            if field.sortable {
                args.push("SORTABLE".to_string());
            }
        }
        args
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> SearchResult<T> {
    #[inline]
    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.total
    }
}

/// Runs composed queries against one RediSearch index.
#[derive(Debug, Clone)]
pub struct RediSearchStore {
    definition: IndexDefinition,
}

impl RediSearchStore {
    pub fn new(definition: IndexDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Create the index unless it already exists.
    pub async fn ensure_index(&self, conn: &mut ConnectionManager) -> Result<(), StoreError> {
        let indexes: Vec<String> = cmd("FT._LIST").query_async(conn).await?;
        if indexes.iter().any(|name| name == &self.definition.name) {
            return Ok(());
        }

        let mut command = cmd("FT.CREATE");
        for arg in self.definition.create_args() {
            command.arg(arg);
        }

        if let Err(err) = command.query_async::<()>(conn).await {
            if index_exists_error(&err) {
                return Ok(());
            }
            return Err(err.into());
        }
        log::info!("created search index {}", self.definition.name);
        Ok(())
    }

    pub async fn search<T>(&self, conn: &mut ConnectionManager, params: &SearchParams) -> Result<SearchResult<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let query = params.query.to_query_string();
        log::debug!("FT.SEARCH {} {}", self.definition.name, query);

        let mut command = cmd("FT.SEARCH");
        command.arg(&self.definition.name);
        command.arg(query);

        if let Some(sort) = &params.sort {
            command.arg("SORTBY").arg(&sort.target).arg(sort.order.as_str());
        }

        command.arg("LIMIT").arg(params.offset()).arg(params.page_size);
        command.arg("RETURN").arg(1).arg("$");
        command.arg("DIALECT").arg(3);

        let raw: Value = command.query_async(conn).await?;
        let values: Vec<Value> = from_redis_value(&raw).map_err(|err| decode_error(format!("Failed to parse search response: {err}")))?;

        if values.is_empty() {
            return Ok(SearchResult {
                items: Vec::new(),
                total: 0,
                page: params.page,
                page_size: params.page_size,
            });
        }

        let total = match &values[0] {
            Value::Int(v) => *v as u64,
            Value::BulkString(bytes) => String::from_utf8(bytes.clone())
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| decode_error("Invalid total count in search response".to_string()))?,
            other => return Err(decode_error(format!("Unexpected total count type: {other:?}"))),
        };

        let mut items = Vec::new();
        let mut idx = 1;
        while idx + 1 < values.len() {
            let json_payload = extract_json_payload(&values[idx + 1])?;
            let item: T = serde_json::from_str(&json_payload)
                .map_err(|err| decode_error(format!("Failed to deserialize search document: {err}")))?;
            items.push(item);
            idx += 2;
        }

        Ok(SearchResult {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
        })
    }
}

fn decode_error(message: String) -> StoreError {
    StoreError::Decode {
        message: Cow::Owned(message),
    }
}

fn index_exists_error(err: &redis::RedisError) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("already exists") && msg.contains("index")
}

fn extract_json_payload(value: &Value) -> Result<String, StoreError> {
    match value {
        Value::Array(items) => {
            for chunk in items.chunks(2) {
                if chunk.len() != 2 {
                    continue;
                }
                let alias: String = from_redis_value(&chunk[0])
                    .map_err(|err| decode_error(format!("Invalid field alias in search document: {err}")))?;
                if alias == "$" {
                    return normalize_json_payload(value_to_string(&chunk[1])?);
                }
            }
            Err(decode_error("Search response missing JSON payload".to_string()))
        }
        other => normalize_json_payload(value_to_string(other)?),
    }
}

/// `RETURN 1 $` under DIALECT 3 wraps the document in a one-element array.
fn normalize_json_payload(payload: String) -> Result<String, StoreError> {
    let trimmed = payload.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let value: JsonValue = serde_json::from_str(trimmed)
            .map_err(|err| decode_error(format!("Failed to parse JSON payload array: {err}")))?;
        if let Some(first) = value.as_array().and_then(|arr| arr.first()) {
            return serde_json::to_string(first)
                .map_err(|err| decode_error(format!("Failed to serialize JSON payload element: {err}")));
        }
    }
    Ok(payload)
}

fn value_to_string(value: &Value) -> Result<String, StoreError> {
    match value {
        Value::BulkString(bytes) => {
            String::from_utf8(bytes.clone()).map_err(|err| decode_error(format!("Invalid UTF-8 in search response: {err}")))
        }
        Value::SimpleString(status) => Ok(status.clone()),
        Value::Int(v) => Ok(v.to_string()),
        Value::Double(v) => Ok(v.to_string()),
        Value::Boolean(v) => Ok(v.to_string()),
        Value::VerbatimString { text, .. } => Ok(text.clone()),
        _ => from_redis_value::<String>(value).map_err(|err| decode_error(format!("Unexpected search value type: {err}"))),
    }
}
