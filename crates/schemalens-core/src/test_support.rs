//! In-memory catalog used by unit tests

use crate::{
    Catalog, CatalogColumn, CatalogConstraint, ConnectionConfig, ConstraintKind, LimitRule,
    Result, SchemaLensError, SemanticType, TypeCondition, TypeMap,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryTable {
    pub columns: Vec<CatalogColumn>,
    pub constraints: Vec<CatalogConstraint>,
}

pub struct MemoryCatalog {
    config: ConnectionConfig,
    tables: Mutex<BTreeMap<String, MemoryTable>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig::new_mysql("localhost", 3306, "schemalens_test", "root")
                .with_param("characterEncoding", "utf8")
                .with_param("useUnicode", "true")
                .with_param("zeroDateTimeBehavior", "convertToNull"),
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn table(mut self, name: &str, table: MemoryTable) -> Self {
        self.tables
            .get_mut()
            .unwrap()
            .insert(name.to_string(), table);
        self
    }

    /// Swap a table's definition in place, as a migration would
    pub fn replace_table(&self, name: &str, table: MemoryTable) {
        self.tables.lock().unwrap().insert(name.to_string(), table);
    }
}

impl MemoryTable {
    pub fn column(mut self, column: CatalogColumn) -> Self {
        let mut column = column;
        column.ordinal = self.columns.len() + 1;
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.constraints.push(CatalogConstraint {
            name: "PRIMARY".to_string(),
            kind: ConstraintKind::PrimaryKey,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn foreign_key(
        mut self,
        name: &str,
        columns: &[&str],
        referenced_table: &str,
        referenced_columns: &[&str],
    ) -> Self {
        self.constraints.push(CatalogConstraint {
            name: name.to_string(),
            kind: ConstraintKind::ForeignKey {
                referenced_table: referenced_table.to_string(),
                referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
            },
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn unique(mut self, name: &str, columns: &[&str]) -> Self {
        self.constraints.push(CatalogConstraint {
            name: name.to_string(),
            kind: ConstraintKind::Unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }
}

/// A nullable column with no default
pub fn col(name: &str, data_type: &str, column_type: &str) -> CatalogColumn {
    CatalogColumn {
        name: name.to_string(),
        data_type: data_type.to_string(),
        column_type: column_type.to_string(),
        nullable: true,
        ..Default::default()
    }
}

/// Auto-increment integer key column
pub fn id_col(name: &str) -> CatalogColumn {
    CatalogColumn {
        nullable: false,
        is_auto_increment: true,
        ..col(name, "int", "int(11)")
    }
}

/// The fixture tables: books, cars, cats, memos
pub fn fixture_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .table(
            "books",
            MemoryTable::default()
                .column(id_col("id"))
                .column(col("title", "varchar", "varchar(255)"))
                .column(col("created_at", "datetime", "datetime"))
                .column(col("updated_at", "datetime", "datetime"))
                .primary_key(&["id"]),
        )
        .table(
            "cars",
            MemoryTable::default()
                .column(id_col("legacy_id"))
                .column(col("name", "varchar", "varchar(255)"))
                .column(col("production_started_on", "date", "date"))
                .primary_key(&["legacy_id"]),
        )
        .table(
            "cats",
            MemoryTable::default().column(col("name", "varchar", "varchar(255)")),
        )
        .table(
            "memos",
            MemoryTable::default()
                .column(id_col("id"))
                .column(col("text", "longtext", "longtext"))
                .primary_key(&["id"]),
        )
}

/// A trimmed-down MySQL-like type map
pub fn test_type_map() -> TypeMap {
    TypeMap::new("mysql")
        .max_limit(i32::MAX as i64)
        .rule_when(
            "tinyint",
            TypeCondition::DisplayWidth(1),
            SemanticType::Boolean,
            LimitRule::None,
        )
        .rule("tinyint", SemanticType::Integer, LimitRule::Fixed(1))
        .rule("smallint", SemanticType::Integer, LimitRule::Fixed(2))
        .rule("int", SemanticType::Integer, LimitRule::Fixed(4))
        .rule("bigint", SemanticType::Integer, LimitRule::Fixed(8))
        .rule("decimal", SemanticType::Decimal, LimitRule::None)
        .rule("float", SemanticType::Float, LimitRule::None)
        .rule("varchar", SemanticType::String, LimitRule::Declared)
        .rule("text", SemanticType::Text, LimitRule::Fixed(65_535))
        .rule("longtext", SemanticType::Text, LimitRule::Fixed(4_294_967_295))
        .rule("blob", SemanticType::Binary, LimitRule::Fixed(65_535))
        .rule("date", SemanticType::Date, LimitRule::None)
        .rule("datetime", SemanticType::Datetime, LimitRule::None)
        .rule("timestamp", SemanticType::Datetime, LimitRule::None)
        .rule("time", SemanticType::Time, LimitRule::None)
}

#[async_trait]
impl Catalog for MemoryCatalog {
    fn dialect_id(&self) -> &str {
        "mysql"
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.lock().unwrap().keys().cloned().collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| SchemaLensError::table_not_found(table))
    }

    async fn list_constraints(&self, table: &str) -> Result<Vec<CatalogConstraint>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.constraints.clone())
            .unwrap_or_default())
    }
}
