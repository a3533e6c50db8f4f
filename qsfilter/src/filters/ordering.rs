use std::cmp;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::schema::Schema;
use crate::values::{FieldValue, FilterTarget};

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortTerm {
    pub field: String,
    pub target: String,
    pub order: SortOrder,
}

/// Requested result ordering, most significant term first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ordering {
    pub terms: Vec<SortTerm>,
}

impl Ordering {
    /// Parse `title,-date_created` style ordering.
    ///
    /// A leading `-` sorts descending. Terms naming unknown or non-sortable
    /// fields are dropped rather than rejected.
    pub fn parse(raw: &str, schema: &Schema) -> Self {
        let terms = raw
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .filter_map(|term| {
                let (name, order) = match term.strip_prefix('-') {
                    Some(name) => (name, SortOrder::Desc),
                    None => (term, SortOrder::Asc),
                };
                match schema.field(name) {
                    Some(field) if field.sortable && !field.is_computed() => Some(SortTerm {
                        field: field.name.clone(),
                        target: field.target().to_string(),
                        order,
                    }),
                    _ => {
                        log::debug!("ignoring ordering term '{term}'");
                        None
                    }
                }
            })
            .collect();
        Self { terms }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term used by stores that only sort on a single key.
    pub fn primary(&self) -> Option<&SortTerm> {
        self.terms.first()
    }

    /// Stable multi-key sort of an in-memory collection.
    pub fn sort<T: FilterTarget>(&self, items: &mut [T]) {
        if self.terms.is_empty() {
            return;
        }
        items.sort_by(|a, b| self.compare(a, b));
    }

    fn compare<T: FilterTarget>(&self, a: &T, b: &T) -> cmp::Ordering {
        for term in &self.terms {
            let left = a.field_value(&term.target).unwrap_or(FieldValue::Null);
            let right = b.field_value(&term.target).unwrap_or(FieldValue::Null);
            let ordering = match term.order {
                SortOrder::Asc => left.sort_cmp(&right),
                SortOrder::Desc => right.sort_cmp(&left),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        cmp::Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldKind};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .filterable("title", FieldKind::Text)
            .sourced("date_created", FieldKind::Temporal, "created")
            .with_field(FieldDescriptor {
                filterable: true,
                ..FieldDescriptor::new("secret", FieldKind::Text)
            })
            .build()
    }

    #[test]
    fn parses_terms_and_drops_unsortable_ones() {
        let ordering = Ordering::parse(" -date_created , secret,, nope ,title", &schema());
        assert_eq!(
            ordering.terms,
            vec![
                SortTerm {
                    field: "date_created".to_string(),
                    target: "created".to_string(),
                    order: SortOrder::Desc,
                },
                SortTerm {
                    field: "title".to_string(),
                    target: "title".to_string(),
                    order: SortOrder::Asc,
                },
            ]
        );
        assert_eq!(ordering.primary().map(|term| term.order), Some(SortOrder::Desc));
        assert!(Ordering::parse("", &schema()).is_empty());
    }

    #[test]
    fn sorts_by_multiple_keys() {
        let ordering = Ordering::parse("-created,title", &schema());
        assert!(ordering.is_empty(), "source attribute names are not field names");

        let ordering = Ordering::parse("-date_created,title", &schema());
        let mut items = vec![
            json!({"title": "b", "created": "2020-01-01T00:00:00Z"}),
            json!({"title": "a", "created": "2020-01-01T00:00:00Z"}),
            json!({"title": "c", "created": "2021-01-01T00:00:00Z"}),
        ];
        ordering.sort(&mut items);
        let titles: Vec<&str> = items.iter().filter_map(|item| item["title"].as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }
}
