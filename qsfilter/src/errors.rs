use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::filters::FilterOperator;

/// Client-input errors raised while turning query parameters into filters.
///
/// Every variant stems from untrusted request input, so all of them map to a
/// `400 Bad Request` at the response layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The field is not declared on the schema at all.
    #[error("'{field}' is not a valid field for this endpoint.")]
    InvalidFilter { field: String },

    /// The field exists but is not allow-listed for filtering.
    #[error("'{attribute}' is not a filterable field.")]
    InvalidFilterField { attribute: String },

    /// The operator token is not one of the supported operators.
    #[error("Value '{value}' is not a supported filter operator; use one of {ops}.", ops = supported_operators())]
    InvalidFilterOperator { value: String },

    /// Comparison operator used against a field that is neither numeric nor temporal.
    #[error("Comparison operators are only supported for dates and numbers (field '{attribute}').")]
    InvalidFilterComparisonType { attribute: String },

    /// Match operator used against a field that is neither text nor a list.
    #[error("Match operators are only supported for strings and lists (field '{attribute}').")]
    InvalidFilterMatchType { attribute: String },

    /// The raw value could not be coerced into the field's type.
    #[error("Value '{value}' is not valid for a filter on type {field_type}.")]
    InvalidFilterValue { value: String, field_type: &'static str },
}

fn supported_operators() -> String {
    FilterOperator::ALL
        .iter()
        .map(|op| op.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FilterError {
    /// HTTP status the response layer should use.
    #[inline]
    pub const fn status(&self) -> u16 {
        400
    }

    /// Stable machine-readable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            FilterError::InvalidFilter { .. } => "invalid_filter",
            FilterError::InvalidFilterField { .. } => "invalid_filter_field",
            FilterError::InvalidFilterOperator { .. } => "invalid_filter_operator",
            FilterError::InvalidFilterComparisonType { .. } => "invalid_filter_comparison_type",
            FilterError::InvalidFilterMatchType { .. } => "invalid_filter_match_type",
            FilterError::InvalidFilterValue { .. } => "invalid_filter_value",
        }
    }

    /// Name of the field the error points at, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            FilterError::InvalidFilter { field } => Some(field.as_str()),
            FilterError::InvalidFilterField { attribute }
            | FilterError::InvalidFilterComparisonType { attribute }
            | FilterError::InvalidFilterMatchType { attribute } => Some(attribute.as_str()),
            FilterError::InvalidFilterOperator { .. } | FilterError::InvalidFilterValue { .. } => None,
        }
    }

    /// Render the error as a JSON-API style error object.
    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail {
            status: self.status().to_string(),
            code: self.code().to_string(),
            detail: self.to_string(),
            source: self.field().map(|field| ErrorSource {
                parameter: format!("filter[{field}]"),
            }),
        }
    }
}

/// Serializable error body handed to the response layer.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub status: String,
    pub code: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSource {
    pub parameter: String,
}

/// Failure while loading configuration or schema files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Parsed fine but describes something unusable (e.g. duplicate fields).
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors returned by the RediSearch-backed store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Response from the store could not be decoded.
    #[error("{message}")]
    Decode { message: Cow<'static, str> },
}

pub type FilterResult<T> = Result<T, FilterError>;
