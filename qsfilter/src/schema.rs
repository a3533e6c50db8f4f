//! Declared fields of a filterable resource.
//!
//! A [`Schema`] is the read-only contract between the serialization layer and the
//! filter layer: which fields exist, what kind each one is, whether clients may
//! filter or sort on it, and which attribute actually holds its value.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::errors::ConfigError;
use crate::filters::FilterOperator;

/// Closed set of field kinds understood by the filter layer.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Numeric,
    Temporal,
    Text,
    List,
}

impl FieldKind {
    const EQ_ONLY: &'static [FilterOperator] = &[FilterOperator::Eq];
    const COMPARABLE: &'static [FilterOperator] = &[
        FilterOperator::Eq,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Gt,
        FilterOperator::Gte,
    ];
    const MATCHABLE: &'static [FilterOperator] =
        &[FilterOperator::Eq, FilterOperator::Contains, FilterOperator::Icontains];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Numeric => "numeric",
            FieldKind::Temporal => "temporal",
            FieldKind::Text => "text",
            FieldKind::List => "list",
        }
    }

    /// Operator applied when a parameter omits the `[op]` suffix.
    #[inline]
    pub const fn default_operator(self) -> FilterOperator {
        match self {
            FieldKind::Text => FilterOperator::Icontains,
            FieldKind::List => FilterOperator::Contains,
            _ => FilterOperator::Eq,
        }
    }

    /// Numeric and temporal fields accept `lt`/`lte`/`gt`/`gte`.
    #[inline]
    pub const fn is_comparable(self) -> bool {
        matches!(self, FieldKind::Numeric | FieldKind::Temporal)
    }

    /// Text and list fields accept `contains`/`icontains`.
    #[inline]
    pub const fn is_matchable(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::List)
    }

    pub const fn allowed_operators(self) -> &'static [FilterOperator] {
        if self.is_comparable() {
            Self::COMPARABLE
        } else if self.is_matchable() {
            Self::MATCHABLE
        } else {
            Self::EQ_ONLY
        }
    }

    #[inline]
    pub fn supports(self, operator: FilterOperator) -> bool {
        self.allowed_operators().contains(&operator)
    }
}

/// Where the value of a field comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Read the attribute with the same name as the field.
    Declared,
    /// Read a differently named attribute.
    Attribute(String),
    /// Produced by an accessor at serialization time; no stored attribute exists.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub filterable: bool,
    pub sortable: bool,
    pub source: FieldSource,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            filterable: false,
            sortable: false,
            source: FieldSource::Declared,
        }
    }

    /// Attribute name filters against this field resolve to.
    pub fn target(&self) -> &str {
        match &self.source {
            FieldSource::Attribute(attribute) => attribute,
            FieldSource::Declared | FieldSource::Computed => &self.name,
        }
    }

    #[inline]
    pub fn is_computed(&self) -> bool {
        matches!(self.source, FieldSource::Computed)
    }
}

/// Declared fields of one resource, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn filterable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.filterable)
    }

    pub fn sortable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.sortable)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a schema from its TOML representation.
    ///
    /// ```toml
    /// [[fields]]
    /// name = "date_created"
    /// kind = "temporal"
    /// filterable = true
    /// sortable = true
    /// source = "created"
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: SchemaFile = toml::from_str(input)?;
        file.into_schema()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Incrementally assembles a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Declare a field that is filterable and sortable.
    pub fn filterable(self, name: impl Into<String>, kind: FieldKind) -> Self {
        let mut field = FieldDescriptor::new(name, kind);
        field.filterable = true;
        field.sortable = true;
        self.with_field(field)
    }

    /// Declare a field clients can see but not filter or sort on.
    pub fn declared(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.with_field(FieldDescriptor::new(name, kind))
    }

    /// Declare a filterable field whose value lives under a different attribute.
    pub fn sourced(self, name: impl Into<String>, kind: FieldKind, source: impl Into<String>) -> Self {
        let mut field = FieldDescriptor::new(name, kind);
        field.filterable = true;
        field.sortable = true;
        field.source = FieldSource::Attribute(source.into());
        self.with_field(field)
    }

    /// Declare a filterable field computed per item.
    pub fn computed(self, name: impl Into<String>, kind: FieldKind) -> Self {
        let mut field = FieldDescriptor::new(name, kind);
        field.filterable = true;
        field.source = FieldSource::Computed;
        self.with_field(field)
    }

    /// Add a fully specified descriptor. A later declaration of the same name wins.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.retain(|existing| existing.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Schema {
        let by_name = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name.clone(), idx))
            .collect();
        Schema {
            fields: self.fields,
            by_name,
        }
    }
}

/// Implemented by resources that carry their schema statically.
///
/// Usually produced by `#[derive(FilterSchema)]`.
pub trait DeclaredSchema {
    fn schema() -> Schema;
}

/// On-disk schema layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub fields: Vec<SchemaFileField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFileField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub computed: bool,
}

impl SchemaFile {
    pub fn into_schema(self) -> Result<Schema, ConfigError> {
        let mut builder = Schema::builder();
        let mut seen = std::collections::HashSet::new();
        for entry in self.fields {
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::Invalid {
                    message: format!("field '{}' is declared more than once", entry.name),
                });
            }
            let source = match (entry.computed, entry.source) {
                (true, Some(_)) => {
                    return Err(ConfigError::Invalid {
                        message: format!("computed field '{}' cannot also declare a source", entry.name),
                    });
                }
                (true, None) => FieldSource::Computed,
                (false, Some(attribute)) => FieldSource::Attribute(attribute),
                (false, None) => FieldSource::Declared,
            };
            builder = builder.with_field(FieldDescriptor {
                name: entry.name,
                kind: entry.kind,
                filterable: entry.filterable,
                sortable: entry.sortable,
                source,
            });
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_carry_operator_tables() {
        assert_eq!(FieldKind::Text.default_operator(), FilterOperator::Icontains);
        assert_eq!(FieldKind::List.default_operator(), FilterOperator::Contains);
        assert_eq!(FieldKind::Temporal.default_operator(), FilterOperator::Eq);

        assert!(FieldKind::Numeric.supports(FilterOperator::Gte));
        assert!(!FieldKind::Numeric.supports(FilterOperator::Contains));
        assert!(FieldKind::List.supports(FilterOperator::Icontains));
        assert!(!FieldKind::Text.supports(FilterOperator::Lt));
        assert_eq!(FieldKind::Boolean.allowed_operators(), &[FilterOperator::Eq]);
    }

    #[test]
    fn builder_resolves_targets() {
        let schema = Schema::builder()
            .filterable("title", FieldKind::Text)
            .sourced("date_created", FieldKind::Temporal, "created")
            .computed("contributor_count", FieldKind::Numeric)
            .declared("description", FieldKind::Text)
            .build();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.field("title").map(FieldDescriptor::target), Some("title"));
        assert_eq!(schema.field("date_created").map(FieldDescriptor::target), Some("created"));
        assert!(schema.field("contributor_count").is_some_and(FieldDescriptor::is_computed));
        assert_eq!(schema.filterable_fields().count(), 3);
        assert_eq!(schema.sortable_fields().count(), 2);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn later_declaration_replaces_earlier_one() {
        let schema = Schema::builder()
            .declared("title", FieldKind::Text)
            .filterable("title", FieldKind::Text)
            .build();
        assert_eq!(schema.len(), 1);
        assert!(schema.field("title").is_some_and(|f| f.filterable));
    }

    #[test]
    fn schema_parses_from_toml() {
        let schema = Schema::from_toml_str(
            r#"
            [[fields]]
            name = "title"
            kind = "text"
            filterable = true

            [[fields]]
            name = "date_created"
            kind = "temporal"
            filterable = true
            sortable = true
            source = "created"

            [[fields]]
            name = "comment_count"
            kind = "numeric"
            filterable = true
            computed = true
            "#,
        )
        .expect("schema should parse");

        assert_eq!(schema.len(), 3);
        let created = schema.field("date_created").expect("date_created declared");
        assert_eq!(created.kind, FieldKind::Temporal);
        assert_eq!(created.source, FieldSource::Attribute("created".to_string()));
        assert!(created.sortable);
        assert!(!schema.field("title").expect("title declared").sortable);
        assert!(schema.field("comment_count").expect("declared").is_computed());
    }

    #[test]
    fn schema_rejects_duplicate_fields() {
        let err = Schema::from_toml_str(
            r#"
            [[fields]]
            name = "title"
            kind = "text"

            [[fields]]
            name = "title"
            kind = "list"
            "#,
        )
        .expect_err("duplicates rejected");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn schema_rejects_unknown_kind() {
        let err = Schema::from_toml_str(
            r#"
            [[fields]]
            name = "title"
            kind = "blob"
            "#,
        )
        .expect_err("unknown kind rejected");
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
