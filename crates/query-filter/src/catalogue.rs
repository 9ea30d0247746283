//! Field catalogue: the typed description of a record's fields.
//!
//! A [`FieldCatalogue`] is built once per record type from a static list of
//! [`ColumnDef`]s, either supplied directly, through the [`RecordSchema`]
//! trait, or deserialized from a schema document ([`SchemaDef`]).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::error::{FilterError, FilterResult};

/// Maximum Levenshtein distance to consider a field name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Coarse classification of a field's native type.
///
/// Selects the permitted operators and the casting rules for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeCategory {
    String,
    Numeric,
    Boolean,
    Datetime,
    Date,
    Identifier,
    Default,
}

impl TypeCategory {
    /// Returns the canonical name of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeCategory::String => "string",
            TypeCategory::Numeric => "numeric",
            TypeCategory::Boolean => "boolean",
            TypeCategory::Datetime => "datetime",
            TypeCategory::Date => "date",
            TypeCategory::Identifier => "identifier",
            TypeCategory::Default => "default",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeCategory {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(TypeCategory::String),
            "numeric" => Ok(TypeCategory::Numeric),
            "boolean" => Ok(TypeCategory::Boolean),
            "datetime" => Ok(TypeCategory::Datetime),
            "date" => Ok(TypeCategory::Date),
            "identifier" | "uuid" => Ok(TypeCategory::Identifier),
            "default" => Ok(TypeCategory::Default),
            other => Err(FilterError::config(format!(
                "unknown type category '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for TypeCategory {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeCategory> for String {
    fn from(category: TypeCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Native column types a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[serde(alias = "str", alias = "varchar")]
    String,
    Text,
    #[serde(alias = "int")]
    Integer,
    BigInteger,
    SmallInteger,
    Float,
    Decimal,
    #[serde(alias = "bool")]
    Boolean,
    Date,
    #[serde(alias = "timestamp")]
    DateTime,
    Time,
    Uuid,
    Json,
    Binary,
}

impl ColumnType {
    /// Maps a native type onto its category.
    pub fn category(self) -> TypeCategory {
        match self {
            ColumnType::String | ColumnType::Text => TypeCategory::String,
            ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::SmallInteger
            | ColumnType::Float
            | ColumnType::Decimal => TypeCategory::Numeric,
            ColumnType::Boolean => TypeCategory::Boolean,
            ColumnType::Date => TypeCategory::Date,
            ColumnType::DateTime => TypeCategory::Datetime,
            ColumnType::Uuid => TypeCategory::Identifier,
            ColumnType::Time | ColumnType::Json | ColumnType::Binary => TypeCategory::Default,
        }
    }
}

/// Declaration of one field, as supplied by a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Field name.
    pub name: String,

    /// Native type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether this field is the primary key.
    #[serde(default)]
    pub primary_key: bool,

    /// Whether this field references another record's key.
    #[serde(default)]
    pub foreign_key: bool,

    /// Overrides filterability (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable: Option<bool>,

    /// Overrides sortability (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,

    /// Overrides searchability (default: true for string fields).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,
}

impl ColumnDef {
    /// Creates a column with default flags.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            foreign_key: false,
            filterable: None,
            sortable: None,
            searchable: None,
        }
    }

    /// Marks the column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as a foreign key.
    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    /// Sets whether the column can be filtered on.
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = Some(filterable);
        self
    }

    /// Sets whether the column can be sorted on.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    /// Sets whether the column takes part in free-text search.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = Some(searchable);
        self
    }
}

/// Resolved description of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub category: TypeCategory,
    pub primary_key: bool,
    pub foreign_key: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub searchable: bool,
}

impl From<ColumnDef> for FieldDescriptor {
    /// Key columns stored as text hold identifiers and categorize as such;
    /// numeric keys stay numeric.
    fn from(def: ColumnDef) -> Self {
        let category = match def.column_type {
            ColumnType::String | ColumnType::Text if def.primary_key || def.foreign_key => {
                TypeCategory::Identifier
            }
            other => other.category(),
        };
        Self {
            category,
            column_type: def.column_type,
            primary_key: def.primary_key,
            foreign_key: def.foreign_key,
            filterable: def.filterable.unwrap_or(true),
            sortable: def.sortable.unwrap_or(true),
            searchable: def
                .searchable
                .unwrap_or(category == TypeCategory::String),
            name: def.name,
        }
    }
}

/// A record type that can describe its own fields.
///
/// ```
/// use query_filter_rs::catalogue::{ColumnDef, ColumnType, FieldCatalogue, RecordSchema};
///
/// struct Post;
///
/// impl RecordSchema for Post {
///     const NAME: &'static str = "posts";
///
///     fn columns() -> Vec<ColumnDef> {
///         vec![
///             ColumnDef::new("id", ColumnType::Uuid).primary_key(),
///             ColumnDef::new("title", ColumnType::String),
///         ]
///     }
/// }
///
/// let catalogue = FieldCatalogue::for_schema::<Post>();
/// assert_eq!(catalogue.len(), 2);
/// ```
pub trait RecordSchema {
    /// Name of the record type (used in logs and SQL rendering).
    const NAME: &'static str;

    /// The declared fields, in display order.
    fn columns() -> Vec<ColumnDef>;
}

/// A schema document: record name plus field declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<ColumnDef>,
}

impl SchemaDef {
    /// Parses a schema from TOML.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Config` if the document is not a valid schema.
    pub fn from_toml_str(input: &str) -> FilterResult<Self> {
        toml::from_str(input).map_err(|e| FilterError::config(format!("invalid schema: {e}")))
    }

    /// Builds the catalogue for this schema.
    pub fn into_catalogue(self) -> FieldCatalogue {
        FieldCatalogue::from_columns(self.name, self.fields)
    }
}

/// Ordered, immutable lookup of field descriptors for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalogue {
    name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldCatalogue {
    /// Builds a catalogue from column declarations.
    ///
    /// A later declaration with the same name replaces the earlier one.
    pub fn from_columns(name: impl Into<String>, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut index = HashMap::new();

        for column in columns {
            let descriptor = FieldDescriptor::from(column);
            match index.get(&descriptor.name) {
                Some(&pos) => fields[pos] = descriptor,
                None => {
                    index.insert(descriptor.name.clone(), fields.len());
                    fields.push(descriptor);
                }
            }
        }

        Self {
            name: name.into(),
            fields,
            index,
        }
    }

    /// Builds the catalogue for a [`RecordSchema`] type.
    pub fn for_schema<S: RecordSchema>() -> Self {
        Self::from_columns(S::NAME, S::columns())
    }

    /// Returns the record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the catalogue has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by exact name.
    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.index.get(field).map(|&pos| &self.fields[pos])
    }

    /// Returns the descriptor for `field`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::FieldNotFound` (with a close-match suggestion when
    /// one exists) if the field is not in the catalogue or is not filterable.
    pub fn categorize(&self, field: &str) -> FilterResult<&FieldDescriptor> {
        match self.get(field) {
            Some(descriptor) if descriptor.filterable => Ok(descriptor),
            _ => Err(self.not_found(field)),
        }
    }

    /// Returns the descriptor for `field`, filterable or not.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::FieldNotFound` if the field is not declared.
    pub fn lookup(&self, field: &str) -> FilterResult<&FieldDescriptor> {
        self.get(field).ok_or_else(|| self.not_found(field))
    }

    /// Returns every field, in declaration order.
    pub fn all_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the names of the fields used by free-text search.
    pub fn searchable_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Returns a copy whose searchable set is exactly `fields`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::FieldNotFound` for any unknown name.
    pub fn with_searchable(&self, fields: &[&str]) -> FilterResult<Self> {
        for field in fields {
            self.lookup(field)?;
        }

        let mut catalogue = self.clone();
        for descriptor in &mut catalogue.fields {
            descriptor.searchable = fields.contains(&descriptor.name.as_str());
        }
        Ok(catalogue)
    }

    fn not_found(&self, field: &str) -> FilterError {
        FilterError::FieldNotFound {
            field: field.to_string(),
            suggestion: self.suggest(field),
        }
    }

    /// Finds the closest known field name within the suggestion threshold.
    fn suggest(&self, field: &str) -> Option<String> {
        let query = field.to_lowercase();

        let (best, distance) = self
            .fields
            .iter()
            .map(|f| (f.name.as_str(), levenshtein(&query, &f.name.to_lowercase())))
            .min_by_key(|(_, d)| *d)?;

        if distance > 0 && distance <= MAX_SUGGESTION_DISTANCE {
            Some(best.to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> FieldCatalogue {
        FieldCatalogue::from_columns(
            "users",
            vec![
                ColumnDef::new("id", ColumnType::Uuid).primary_key(),
                ColumnDef::new("username", ColumnType::String),
                ColumnDef::new("email", ColumnType::String),
                ColumnDef::new("password", ColumnType::String).searchable(false),
                ColumnDef::new("full_name", ColumnType::String),
                ColumnDef::new("bio", ColumnType::Text),
                ColumnDef::new("age", ColumnType::Integer),
                ColumnDef::new("is_active", ColumnType::Boolean),
                ColumnDef::new("birth_date", ColumnType::Date),
                ColumnDef::new("created_at", ColumnType::DateTime),
                ColumnDef::new("settings", ColumnType::Json).sortable(false),
            ],
        )
    }

    #[test]
    fn test_categorize_column_types() {
        let catalogue = users();
        let category = |name: &str| catalogue.categorize(name).unwrap().category;

        assert_eq!(category("username"), TypeCategory::String);
        assert_eq!(category("bio"), TypeCategory::String);
        assert_eq!(category("age"), TypeCategory::Numeric);
        assert_eq!(category("is_active"), TypeCategory::Boolean);
        assert_eq!(category("birth_date"), TypeCategory::Date);
        assert_eq!(category("created_at"), TypeCategory::Datetime);
        assert_eq!(category("id"), TypeCategory::Identifier);
        assert_eq!(category("settings"), TypeCategory::Default);
    }

    #[test]
    fn test_integer_primary_key_is_numeric() {
        let catalogue = FieldCatalogue::from_columns(
            "categories",
            vec![ColumnDef::new("id", ColumnType::Integer).primary_key()],
        );
        assert_eq!(
            catalogue.categorize("id").unwrap().category,
            TypeCategory::Numeric
        );
    }

    #[test]
    fn test_textual_keys_are_identifiers() {
        let catalogue = FieldCatalogue::from_columns(
            "comments",
            vec![
                ColumnDef::new("id", ColumnType::String).primary_key(),
                ColumnDef::new("post_id", ColumnType::String).foreign_key(),
                ColumnDef::new("author_id", ColumnType::Integer).foreign_key(),
                ColumnDef::new("body", ColumnType::Text),
            ],
        );
        let field = |name: &str| catalogue.categorize(name).unwrap();

        assert_eq!(field("id").category, TypeCategory::Identifier);
        assert_eq!(field("post_id").category, TypeCategory::Identifier);
        assert!(field("post_id").foreign_key);
        assert!(!field("post_id").searchable);
        assert_eq!(field("author_id").category, TypeCategory::Numeric);
        assert_eq!(field("body").category, TypeCategory::String);
        assert_eq!(catalogue.searchable_fields(), vec!["body"]);
    }

    #[test]
    fn test_all_fields_keeps_declaration_order() {
        let catalogue = users();
        let names: Vec<_> = catalogue.all_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[0], "id");
        assert_eq!(names[1], "username");
        assert_eq!(names.last(), Some(&"settings"));
        assert_eq!(catalogue.len(), 11);
    }

    #[test]
    fn test_default_searchable_fields_are_strings() {
        let catalogue = users();
        let fields = catalogue.searchable_fields();

        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"full_name"));
        assert!(fields.contains(&"bio"));
        assert!(!fields.contains(&"password"));
        assert!(!fields.contains(&"age"));
        assert!(!fields.contains(&"is_active"));
        assert!(!fields.contains(&"created_at"));
    }

    #[test]
    fn test_with_searchable_overrides() {
        let catalogue = users().with_searchable(&["email"]).unwrap();
        assert_eq!(catalogue.searchable_fields(), vec!["email"]);
    }

    #[test]
    fn test_with_searchable_unknown_field() {
        let err = users().with_searchable(&["nope"]).unwrap_err();
        assert!(matches!(err, FilterError::FieldNotFound { .. }));
    }

    #[test]
    fn test_unknown_field_suggestion() {
        let err = users().categorize("usrname").unwrap_err();
        assert_eq!(
            err,
            FilterError::FieldNotFound {
                field: "usrname".to_string(),
                suggestion: Some("username".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_field_without_close_match() {
        let err = users().categorize("non_existent").unwrap_err();
        assert_eq!(err, FilterError::field_not_found("non_existent"));
    }

    #[test]
    fn test_non_filterable_field_is_not_found() {
        let catalogue = FieldCatalogue::from_columns(
            "secrets",
            vec![ColumnDef::new("hash", ColumnType::String).filterable(false)],
        );
        assert!(catalogue.categorize("hash").is_err());
        assert!(catalogue.get("hash").is_some());
    }

    #[test]
    fn test_redeclared_column_replaces_previous() {
        let catalogue = FieldCatalogue::from_columns(
            "t",
            vec![
                ColumnDef::new("a", ColumnType::String),
                ColumnDef::new("b", ColumnType::String),
                ColumnDef::new("a", ColumnType::Integer),
            ],
        );
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.all_fields()[0].category, TypeCategory::Numeric);
    }

    #[test]
    fn test_schema_from_toml() {
        let schema = SchemaDef::from_toml_str(
            r#"
            name = "posts"

            [[fields]]
            name = "id"
            type = "uuid"
            primary_key = true

            [[fields]]
            name = "title"
            type = "varchar"

            [[fields]]
            name = "view_count"
            type = "int"
            sortable = false

            [[fields]]
            name = "published_at"
            type = "timestamp"
            "#,
        )
        .unwrap();

        let catalogue = schema.into_catalogue();
        assert_eq!(catalogue.name(), "posts");
        assert_eq!(catalogue.categorize("title").unwrap().category, TypeCategory::String);
        assert!(!catalogue.categorize("view_count").unwrap().sortable);
        assert_eq!(
            catalogue.categorize("published_at").unwrap().category,
            TypeCategory::Datetime
        );
    }

    #[test]
    fn test_schema_from_invalid_toml() {
        let err = SchemaDef::from_toml_str("name = ").unwrap_err();
        assert!(matches!(err, FilterError::Config { .. }));
    }

    #[test]
    fn test_category_parses_uuid_alias() {
        assert_eq!("uuid".parse::<TypeCategory>().unwrap(), TypeCategory::Identifier);
        assert!("nope".parse::<TypeCategory>().is_err());
    }
}
