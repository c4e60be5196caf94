//! MySQL catalog implementation over information_schema

use async_trait::async_trait;
use indexmap::IndexMap;
use mysql_async::{Row, prelude::FromValue};
use schemalens_core::{
    Catalog, CatalogColumn, CatalogConstraint, ConnectionConfig, ConstraintKind, Result,
    SchemaLensError,
};

use crate::{MySqlConnection, ServerFlavor};

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

fn value<T: FromValue>(row: &Row, index: usize, field: &str) -> Result<Option<T>> {
    match row.get_opt::<Option<T>, usize>(index) {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(SchemaLensError::Query(format!(
            "Unexpected {} value in catalog row: {:?}",
            field, e.0
        ))),
        None => Err(SchemaLensError::Query(format!(
            "Catalog row has no {} column",
            field
        ))),
    }
}

fn text(row: &Row, index: usize, field: &str) -> Result<Option<String>> {
    value(row, index, field)
}

fn number(row: &Row, index: usize, field: &str) -> Result<Option<i64>> {
    value(row, index, field)
}

fn required_text(row: &Row, index: usize, field: &str) -> Result<String> {
    text(row, index, field)?
        .ok_or_else(|| SchemaLensError::Query(format!("Catalog row has a NULL {}", field)))
}

/// One row of the key constraint query, before grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyColumnRow {
    pub constraint_name: String,
    pub constraint_type: String,
    pub column_name: String,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
}

/// Group per-column key rows into constraints, keeping query order
pub(crate) fn group_constraints(rows: Vec<KeyColumnRow>) -> Vec<CatalogConstraint> {
    let mut grouped: IndexMap<String, CatalogConstraint> = IndexMap::new();

    for row in rows {
        let kind = match row.constraint_type.as_str() {
            "PRIMARY KEY" => ConstraintKind::PrimaryKey,
            "UNIQUE" => ConstraintKind::Unique,
            "FOREIGN KEY" => ConstraintKind::ForeignKey {
                referenced_table: row.referenced_table.clone().unwrap_or_default(),
                referenced_columns: Vec::new(),
            },
            other => {
                tracing::debug!(constraint_type = %other, "skipping constraint type");
                continue;
            }
        };

        let constraint = grouped
            .entry(row.constraint_name.clone())
            .or_insert_with(|| CatalogConstraint {
                name: row.constraint_name.clone(),
                kind,
                columns: Vec::new(),
            });
        constraint.columns.push(row.column_name);
        if let ConstraintKind::ForeignKey {
            referenced_columns, ..
        } = &mut constraint.kind
            && let Some(column) = row.referenced_column
        {
            referenced_columns.push(column);
        }
    }

    grouped.into_values().collect()
}

/// A column default as interpreted from `COLUMN_DEFAULT` and `EXTRA`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ColumnDefault {
    pub value: Option<String>,
    pub is_expression: bool,
}

impl ColumnDefault {
    fn literal(value: String) -> Self {
        Self {
            value: Some(value),
            is_expression: false,
        }
    }

    fn expression(value: String) -> Self {
        Self {
            value: Some(value),
            is_expression: true,
        }
    }
}

/// Undo MariaDB literal quoting: `'it''s'` -> `it's`
fn unquote_literal(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut literal = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '\\' => {
                if let Some(escaped) = chars.next() {
                    literal.push(escaped);
                }
            }
            other => literal.push(other),
        }
    }
    Some(literal)
}

fn is_numeric_literal(value: &str) -> bool {
    value.parse::<f64>().is_ok()
}

/// Interpret a raw `COLUMN_DEFAULT`.
///
/// MySQL reports literals bare and flags expressions with `DEFAULT_GENERATED`
/// in `EXTRA`. MariaDB 10.2.7+ quotes string literals, reports `NULL` for an
/// explicit null default, and leaves expressions bare.
pub(crate) fn interpret_default(
    raw: Option<String>,
    extra: &str,
    nullable: bool,
    flavor: ServerFlavor,
) -> ColumnDefault {
    let Some(raw) = raw else {
        return ColumnDefault::default();
    };

    match flavor {
        ServerFlavor::MariaDb {
            quoted_defaults: true,
        } => {
            if raw.eq_ignore_ascii_case("NULL") {
                ColumnDefault::default()
            } else if let Some(literal) = unquote_literal(&raw) {
                ColumnDefault::literal(literal)
            } else if is_numeric_literal(&raw) {
                ColumnDefault::literal(raw)
            } else {
                ColumnDefault::expression(raw)
            }
        }
        ServerFlavor::MariaDb {
            quoted_defaults: false,
        } if nullable && raw == "NULL" => ColumnDefault::default(),
        _ if extra.to_ascii_uppercase().contains("DEFAULT_GENERATED") => {
            ColumnDefault::expression(raw)
        }
        _ => ColumnDefault::literal(raw),
    }
}

/// The `ON UPDATE` expression carried in `EXTRA`, e.g. `on update CURRENT_TIMESTAMP(6)`
pub(crate) fn on_update_expression(extra: &str) -> Option<String> {
    const MARKER: &str = "on update ";
    let start = extra.to_ascii_lowercase().find(MARKER)? + MARKER.len();
    let expression = extra[start..].trim();
    (!expression.is_empty()).then(|| expression.to_string())
}

impl MySqlConnection {
    /// SQL expression naming the schema catalog queries are scoped to
    fn schema_predicate(&self) -> String {
        match self.default_database() {
            Some(db) => quote_literal(db),
            None => "DATABASE()".to_string(),
        }
    }
}

#[async_trait]
impl Catalog for MySqlConnection {
    fn dialect_id(&self) -> &str {
        "mysql"
    }

    fn config(&self) -> &ConnectionConfig {
        self.connection_config()
    }

    #[tracing::instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<String>> {
        let query = format!(
            "SELECT TABLE_NAME
             FROM information_schema.TABLES
             WHERE TABLE_SCHEMA = {} AND TABLE_TYPE = 'BASE TABLE'
             ORDER BY TABLE_NAME",
            self.schema_predicate()
        );

        let rows = self.query_rows(&query).await?;
        rows.iter()
            .map(|row| required_text(row, 0, "TABLE_NAME"))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn table_exists(&self, table: &str) -> Result<bool> {
        let query = format!(
            "SELECT COUNT(*)
             FROM information_schema.TABLES
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND TABLE_TYPE = 'BASE TABLE'",
            self.schema_predicate(),
            quote_literal(table)
        );

        let rows = self.query_rows(&query).await?;
        let count = match rows.first() {
            Some(row) => number(row, 0, "COUNT(*)")?.unwrap_or(0),
            None => 0,
        };
        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        let query = format!(
            "SELECT
                COLUMN_NAME,
                ORDINAL_POSITION,
                DATA_TYPE,
                COLUMN_TYPE,
                IS_NULLABLE,
                COLUMN_DEFAULT,
                CHARACTER_MAXIMUM_LENGTH,
                NUMERIC_PRECISION,
                NUMERIC_SCALE,
                EXTRA
             FROM information_schema.COLUMNS
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {}
             ORDER BY ORDINAL_POSITION",
            self.schema_predicate(),
            quote_literal(table)
        );

        let rows = self.query_rows(&query).await?;
        if rows.is_empty() {
            return Err(SchemaLensError::table_not_found(table));
        }

        let zero_dates = self.zero_dates();
        let flavor = self.flavor();
        rows.iter()
            .map(|row| {
                let name = required_text(row, 0, "COLUMN_NAME")?;
                let ordinal = number(row, 1, "ORDINAL_POSITION")?.unwrap_or(0);
                let ordinal = usize::try_from(ordinal).map_err(|_| {
                    SchemaLensError::Query(format!(
                        "Invalid ORDINAL_POSITION {} for column {}",
                        ordinal, name
                    ))
                })?;
                let nullable = text(row, 4, "IS_NULLABLE")?.as_deref() == Some("YES");
                let extra = text(row, 9, "EXTRA")?.unwrap_or_default();

                let mut default =
                    interpret_default(text(row, 5, "COLUMN_DEFAULT")?, &extra, nullable, flavor);
                if !default.is_expression {
                    default.value = zero_dates.apply(default.value)?;
                }

                Ok(CatalogColumn {
                    ordinal,
                    data_type: required_text(row, 2, "DATA_TYPE")?,
                    column_type: required_text(row, 3, "COLUMN_TYPE")?,
                    nullable,
                    default_value: default.value,
                    default_is_expression: default.is_expression,
                    on_update: on_update_expression(&extra),
                    character_maximum_length: number(row, 6, "CHARACTER_MAXIMUM_LENGTH")?,
                    numeric_precision: number(row, 7, "NUMERIC_PRECISION")?,
                    numeric_scale: number(row, 8, "NUMERIC_SCALE")?,
                    is_auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
                    name,
                })
            })
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn list_constraints(&self, table: &str) -> Result<Vec<CatalogConstraint>> {
        let query = format!(
            "SELECT
                tc.CONSTRAINT_NAME,
                tc.CONSTRAINT_TYPE,
                kcu.COLUMN_NAME,
                kcu.REFERENCED_TABLE_NAME,
                kcu.REFERENCED_COLUMN_NAME
             FROM information_schema.TABLE_CONSTRAINTS tc
             JOIN information_schema.KEY_COLUMN_USAGE kcu
               ON tc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
               AND tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
               AND tc.TABLE_NAME = kcu.TABLE_NAME
             WHERE tc.TABLE_SCHEMA = {} AND tc.TABLE_NAME = {}
               AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE', 'FOREIGN KEY')
             ORDER BY FIELD(tc.CONSTRAINT_TYPE, 'PRIMARY KEY', 'UNIQUE', 'FOREIGN KEY'),
                      tc.CONSTRAINT_NAME,
                      kcu.ORDINAL_POSITION",
            self.schema_predicate(),
            quote_literal(table)
        );

        let rows = self.query_rows(&query).await?;
        let rows = rows
            .iter()
            .map(|row| {
                Ok(KeyColumnRow {
                    constraint_name: required_text(row, 0, "CONSTRAINT_NAME")?,
                    constraint_type: required_text(row, 1, "CONSTRAINT_TYPE")?,
                    column_name: required_text(row, 2, "COLUMN_NAME")?,
                    referenced_table: text(row, 3, "REFERENCED_TABLE_NAME")?,
                    referenced_column: text(row, 4, "REFERENCED_COLUMN_NAME")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(group_constraints(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key_row(name: &str, kind: &str, column: &str) -> KeyColumnRow {
        KeyColumnRow {
            constraint_name: name.to_string(),
            constraint_type: kind.to_string(),
            column_name: column.to_string(),
            referenced_table: None,
            referenced_column: None,
        }
    }

    #[test]
    fn test_group_constraints_keeps_key_order() {
        let constraints = group_constraints(vec![
            key_row("PRIMARY", "PRIMARY KEY", "group_id"),
            key_row("PRIMARY", "PRIMARY KEY", "user_id"),
            key_row("index_memberships_on_token", "UNIQUE", "token"),
        ]);

        assert_eq!(constraints.len(), 2);
        assert!(constraints[0].is_primary_key());
        assert_eq!(constraints[0].columns, vec!["group_id", "user_id"]);
        assert_eq!(constraints[1].kind, ConstraintKind::Unique);
    }

    #[test]
    fn test_group_constraints_collects_references() {
        let constraints = group_constraints(vec![KeyColumnRow {
            referenced_table: Some("teams".to_string()),
            referenced_column: Some("id".to_string()),
            ..key_row("fk_users_team", "FOREIGN KEY", "team_id")
        }]);

        assert_eq!(
            constraints,
            vec![CatalogConstraint {
                name: "fk_users_team".to_string(),
                kind: ConstraintKind::ForeignKey {
                    referenced_table: "teams".to_string(),
                    referenced_columns: vec!["id".to_string()],
                },
                columns: vec!["team_id".to_string()],
            }]
        );
    }

    const MARIADB: ServerFlavor = ServerFlavor::MariaDb {
        quoted_defaults: true,
    };

    fn raw(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_mariadb_quoted_defaults_are_unquoted() {
        assert_eq!(
            interpret_default(raw("'none'"), "", false, MARIADB),
            ColumnDefault::literal("none".to_string())
        );
        assert_eq!(
            interpret_default(raw("'it''s'"), "", true, MARIADB),
            ColumnDefault::literal("it's".to_string())
        );
        assert_eq!(
            interpret_default(raw("'0000-00-00 00:00:00'"), "", false, MARIADB),
            ColumnDefault::literal("0000-00-00 00:00:00".to_string())
        );
        assert_eq!(
            interpret_default(raw("-1"), "", false, MARIADB),
            ColumnDefault::literal("-1".to_string())
        );
    }

    #[test]
    fn test_mariadb_bare_defaults() {
        assert_eq!(
            interpret_default(raw("NULL"), "", true, MARIADB),
            ColumnDefault::default()
        );
        assert_eq!(
            interpret_default(raw("current_timestamp()"), "", false, MARIADB),
            ColumnDefault::expression("current_timestamp()".to_string())
        );
        assert_eq!(interpret_default(None, "", true, MARIADB), ColumnDefault::default());
    }

    #[test]
    fn test_legacy_mariadb_null_default() {
        let legacy = ServerFlavor::MariaDb {
            quoted_defaults: false,
        };
        assert_eq!(interpret_default(raw("NULL"), "", true, legacy), ColumnDefault::default());
        assert_eq!(
            interpret_default(raw("NULL"), "", false, legacy),
            ColumnDefault::literal("NULL".to_string())
        );
    }

    #[test]
    fn test_mysql_generated_defaults_are_expressions() {
        assert_eq!(
            interpret_default(raw("uuid()"), "DEFAULT_GENERATED", false, ServerFlavor::MySql),
            ColumnDefault::expression("uuid()".to_string())
        );
        assert_eq!(
            interpret_default(raw("uuid()"), "", false, ServerFlavor::MySql),
            ColumnDefault::literal("uuid()".to_string())
        );
        assert_eq!(
            interpret_default(raw("'quoted'"), "", false, ServerFlavor::MySql),
            ColumnDefault::literal("'quoted'".to_string())
        );
    }

    #[test]
    fn test_on_update_expression() {
        assert_eq!(
            on_update_expression("DEFAULT_GENERATED on update CURRENT_TIMESTAMP(6)").as_deref(),
            Some("CURRENT_TIMESTAMP(6)")
        );
        assert_eq!(on_update_expression("auto_increment"), None);
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("books"), "'books'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }
}
