use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::errors::FilterError;

/// Operators accepted in the `filter[field][op]` position.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    Icontains,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 7] = [
        FilterOperator::Eq,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Contains,
        FilterOperator::Icontains,
    ];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Contains => "contains",
            FilterOperator::Icontains => "icontains",
        }
    }

    /// `lt`, `lte`, `gt`, `gte`.
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            FilterOperator::Lt | FilterOperator::Lte | FilterOperator::Gt | FilterOperator::Gte
        )
    }

    /// `contains`, `icontains`.
    #[inline]
    pub const fn is_match(self) -> bool {
        matches!(self, FilterOperator::Contains | FilterOperator::Icontains)
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    /// Operator tokens are matched exactly; `EQ` is not `eq`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| FilterError::InvalidFilterOperator {
                value: token.to_string(),
            })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
