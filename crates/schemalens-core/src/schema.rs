//! Table and column descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic column type, independent of the vendor's native type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Text,
    String,
    Date,
    Datetime,
    Time,
    Decimal,
    Float,
    Binary,
    Boolean,
}

impl SemanticType {
    /// Lowercase name as used in schema dumps (e.g., `t.text`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Integer => "integer",
            SemanticType::Text => "text",
            SemanticType::String => "string",
            SemanticType::Date => "date",
            SemanticType::Datetime => "datetime",
            SemanticType::Time => "time",
            SemanticType::Decimal => "decimal",
            SemanticType::Float => "float",
            SemanticType::Binary => "binary",
            SemanticType::Boolean => "boolean",
        }
    }

    /// Date, datetime and time never carry a limit
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SemanticType::Date | SemanticType::Datetime | SemanticType::Time
        )
    }

    /// Whether a limit is meaningful for this type at all
    pub fn accepts_limit(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer | SemanticType::Text | SemanticType::String | SemanticType::Binary
        )
    }

    /// Limit a column of this type gets when none is declared.
    ///
    /// Schema dumps omit `:limit` when the column's limit equals this value.
    pub fn native_default_limit(&self) -> Option<i64> {
        match self {
            SemanticType::String => Some(255),
            SemanticType::Text => Some(65535),
            SemanticType::Integer => Some(4),
            SemanticType::Binary => Some(65535),
            _ => None,
        }
    }

    /// Whether defaults of this type are rendered as quoted string literals
    pub fn quotes_default(&self) -> bool {
        !matches!(
            self,
            SemanticType::Integer
                | SemanticType::Decimal
                | SemanticType::Float
                | SemanticType::Boolean
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column descriptor derived from the live catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    /// Vendor SQL type, exactly as reported (e.g., "longtext", "int(11)")
    pub sql_type: String,
    /// Byte or character capacity, normalized per dialect
    pub limit: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub default: Option<String>,
    /// `default` is an expression rather than a literal value
    #[serde(default)]
    pub default_is_expression: bool,
    pub on_update: Option<String>,
    pub nullable: bool,
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// Whether the schema dump should print `:limit` for this column
    pub fn has_non_default_limit(&self) -> bool {
        self.limit.is_some() && self.limit != self.semantic_type.native_default_limit()
    }
}

/// Unique or foreign key carried along for structure dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyDescriptor {
    Unique {
        name: String,
        columns: Vec<String>,
    },
    Foreign {
        name: String,
        columns: Vec<String>,
        referenced_table: String,
        referenced_columns: Vec<String>,
    },
}

/// Table descriptor derived from the live catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Single-column primary key; `None` for no key or a composite key
    pub primary_key: Option<String>,
    /// Every primary key column in key order
    pub primary_key_columns: Vec<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub keys: Vec<KeyDescriptor>,
}

impl TableDescriptor {
    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}
