//! Structure and schema dump renderers
//!
//! Both renderers work on descriptors only, so the same output is produced
//! whether the descriptors came from a live server or an in-memory catalog.

use crate::{ColumnDescriptor, KeyDescriptor, SemanticType, TableDescriptor};
use std::collections::HashSet;

/// Quote an identifier, doubling any embedded quote character
pub fn quote_ident(name: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!(
        "{}{}{}",
        quote,
        name.replace(quote, &doubled),
        quote
    )
}

fn quote_ident_list(columns: &[String], quote: char) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c, quote))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop the parenthesized arguments of a vendor type: `datetime(6)` -> `datetime`
fn strip_type_arguments(sql_type: &str) -> String {
    match (sql_type.find('('), sql_type.find(')')) {
        (Some(open), Some(close)) if close > open => {
            let rest = sql_type[close + 1..].trim();
            if rest.is_empty() {
                sql_type[..open].trim().to_string()
            } else {
                format!("{} {}", sql_type[..open].trim(), rest)
            }
        }
        _ => sql_type.to_string(),
    }
}

fn is_timestamp_function(expr: &str) -> bool {
    let lower = expr.to_lowercase();
    ["current_timestamp", "localtimestamp", "localtime", "now("]
        .iter()
        .any(|f| lower.starts_with(f))
}

/// Drop the fractional precision of a timestamp function: `CURRENT_TIMESTAMP(6)` -> `CURRENT_TIMESTAMP`
fn strip_call_precision(expr: &str) -> String {
    let expr = expr.trim();
    let Some(open) = expr.find('(') else {
        return expr.to_string();
    };
    let Some(inner) = expr[open + 1..].strip_suffix(')') else {
        return expr.to_string();
    };
    if inner.trim().is_empty() || !inner.trim().chars().all(|c| c.is_ascii_digit()) {
        return expr.to_string();
    }
    let name = &expr[..open];
    if name.eq_ignore_ascii_case("now") {
        format!("{}()", name)
    } else {
        name.to_string()
    }
}

/// Render a timestamp function, matching the precision of the rendered column type
fn timestamp_function(expr: &str, strip_precision: bool) -> String {
    if strip_precision {
        strip_call_precision(expr)
    } else {
        expr.to_string()
    }
}

fn sql_default(column: &ColumnDescriptor, default: &str, strip_precision: bool) -> String {
    let may_be_function = column.default_is_expression || column.semantic_type.is_temporal();
    if may_be_function && is_timestamp_function(default) {
        timestamp_function(default, strip_precision)
    } else if column.default_is_expression {
        format!("({})", default)
    } else if default.eq_ignore_ascii_case("null") || !column.semantic_type.quotes_default() {
        default.to_string()
    } else {
        format!("'{}'", default.replace('\\', "\\\\").replace('\'', "''"))
    }
}

fn column_definition(column: &ColumnDescriptor, quote: char) -> String {
    let strip_precision = column.semantic_type.is_temporal();
    let sql_type = if strip_precision {
        strip_type_arguments(&column.sql_type)
    } else {
        column.sql_type.clone()
    };

    let mut def = format!("  {} {}", quote_ident(&column.name, quote), sql_type);
    if !column.nullable {
        def.push_str(" NOT NULL");
    } else if sql_type.starts_with("timestamp") {
        // Older servers make a bare timestamp column NOT NULL
        def.push_str(" NULL");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(&sql_default(column, default, strip_precision));
    }
    if let Some(on_update) = &column.on_update {
        def.push_str(" ON UPDATE ");
        def.push_str(&timestamp_function(on_update, strip_precision));
    }
    if column.auto_increment {
        def.push_str(" AUTO_INCREMENT");
    }
    def
}

/// Render one `CREATE TABLE` statement
pub fn create_table_statement(table: &TableDescriptor, quote: char) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_definition(c, quote))
        .collect();

    if !table.primary_key_columns.is_empty() {
        lines.push(format!(
            "  PRIMARY KEY ({})",
            quote_ident_list(&table.primary_key_columns, quote)
        ));
    }

    for key in &table.keys {
        match key {
            KeyDescriptor::Unique { name, columns } => lines.push(format!(
                "  UNIQUE KEY {} ({})",
                quote_ident(name, quote),
                quote_ident_list(columns, quote)
            )),
            KeyDescriptor::Foreign {
                name,
                columns,
                referenced_table,
                referenced_columns,
            } => lines.push(format!(
                "  CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(name, quote),
                quote_ident_list(columns, quote),
                quote_ident(referenced_table, quote),
                quote_ident_list(referenced_columns, quote)
            )),
        }
    }

    format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_ident(&table.name, quote),
        lines.join(",\n")
    )
}

fn referenced_tables(table: &TableDescriptor) -> impl Iterator<Item = &str> {
    table.keys.iter().filter_map(|key| match key {
        KeyDescriptor::Foreign {
            referenced_table, ..
        } => Some(referenced_table.as_str()),
        KeyDescriptor::Unique { .. } => None,
    })
}

/// Order tables so each one follows the tables its foreign keys reference.
///
/// Independent tables keep their given order. Tables in a reference cycle are
/// emitted in given order once nothing else is ready.
pub fn dependency_order(tables: &[TableDescriptor]) -> Vec<&TableDescriptor> {
    let names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let mut created: HashSet<&str> = HashSet::new();
    let mut pending: Vec<&TableDescriptor> = tables.iter().collect();
    let mut ordered = Vec::with_capacity(tables.len());

    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|table| {
                referenced_tables(table).all(|r| {
                    r == table.name || !names.contains(r) || created.contains(r)
                })
            })
            .unwrap_or_else(|| {
                tracing::warn!(table = %pending[0].name, "foreign key cycle in structure dump");
                0
            });
        let table = pending.remove(ready);
        created.insert(table.name.as_str());
        ordered.push(table);
    }
    ordered
}

/// Render a structure dump: one `CREATE TABLE` per table, separated by a blank line.
///
/// Referenced tables are created before the tables whose foreign keys point at them.
pub fn structure_dump(tables: &[TableDescriptor], quote: char) -> String {
    let mut dump = dependency_order(tables)
        .into_iter()
        .map(|t| create_table_statement(t, quote))
        .collect::<Vec<_>>()
        .join("\n\n");
    if !dump.is_empty() {
        dump.push('\n');
    }
    dump
}

/// Double-quoted string literal with backslash escapes
fn quote_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn schema_default(column: &ColumnDescriptor, default: &str) -> String {
    match column.semantic_type {
        SemanticType::Boolean => match default {
            "1" | "b'1'" => "true".to_string(),
            _ => "false".to_string(),
        },
        t if t.quotes_default() => quote_string(default),
        _ => default.to_string(),
    }
}

/// Option columns of a schema dump line, in print order
const SPEC_KEYS: [&str; 6] = ["name", "limit", "precision", "scale", "default", "null"];

fn column_spec(column: &ColumnDescriptor) -> [Option<String>; 6] {
    let limit = if column.has_non_default_limit() && column.semantic_type != SemanticType::Decimal
    {
        column.limit.map(|l| format!(":limit => {}", l))
    } else {
        None
    };
    [
        Some(quote_string(&column.name)),
        limit,
        column.precision.map(|p| format!(":precision => {}", p)),
        column.scale.map(|s| format!(":scale => {}", s)),
        column
            .default
            .as_deref()
            .map(|d| format!(":default => {}", schema_default(column, d))),
        (!column.nullable).then(|| ":null => false".to_string()),
    ]
}

fn schema_table(table: &TableDescriptor) -> String {
    let mut out = format!("  create_table {}", quote_string(&table.name));
    match table.primary_key.as_deref() {
        Some("id") => {}
        Some(pk) => out.push_str(&format!(", :primary_key => {}", quote_string(pk))),
        None => out.push_str(", :id => false"),
    }
    out.push_str(", :force => true do |t|\n");

    let columns: Vec<&ColumnDescriptor> = table
        .columns
        .iter()
        .filter(|c| Some(c.name.as_str()) != table.primary_key.as_deref())
        .collect();
    let specs: Vec<[Option<String>; 6]> = columns.iter().map(|c| column_spec(c)).collect();

    let type_width = columns
        .iter()
        .map(|c| c.semantic_type.as_str().len())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..SPEC_KEYS.len())
        .map(|i| {
            specs
                .iter()
                .map(|spec| spec[i].as_ref().map_or(0, |v| v.len() + 2))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for (column, spec) in columns.iter().zip(&specs) {
        let mut line = format!(
            "    t.{:<width$} ",
            column.semantic_type.as_str(),
            width = type_width
        );
        for (value, width) in spec.iter().zip(&widths) {
            match value {
                Some(v) => line.push_str(&format!("{:<width$}", format!("{}, ", v), width = *width)),
                None => line.push_str(&" ".repeat(*width)),
            }
        }
        let trimmed = line.trim_end().trim_end_matches(',');
        out.push_str(trimmed);
        out.push('\n');
    }
    out.push_str("  end\n");

    for key in &table.keys {
        if let KeyDescriptor::Unique { name, columns } = key {
            let cols = columns
                .iter()
                .map(|c| quote_string(c))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "\n  add_index {}, [{}], :name => {}, :unique => true\n",
                quote_string(&table.name),
                cols,
                quote_string(name)
            ));
        }
    }

    out
}

/// Render a migration-style schema dump of the given tables
pub fn schema_dump(tables: &[TableDescriptor]) -> String {
    tables
        .iter()
        .map(schema_table)
        .collect::<Vec<_>>()
        .join("\n")
}
