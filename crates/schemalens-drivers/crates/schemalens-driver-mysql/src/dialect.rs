//! MySQL native type table
//!
//! Limits of the text and blob families are the storage tier capacities in
//! bytes; integer limits are byte widths. Every limit is clamped to the
//! largest signed 32-bit value so `longtext` reports 2147483647.

use schemalens_core::{LimitRule, SemanticType, TypeCondition, TypeMap};

/// Identifier quote used in MySQL DDL
pub const MYSQL_IDENTIFIER_QUOTE: char = '`';

/// Largest limit MySQL columns report
pub const MYSQL_MAX_LIMIT: i64 = i32::MAX as i64;

/// Build the MySQL type map
pub fn mysql_type_map() -> TypeMap {
    use LimitRule::{Declared, Fixed};
    use SemanticType::*;

    TypeMap::new("mysql")
        .max_limit(MYSQL_MAX_LIMIT)
        // tinyint(1) is the conventional boolean
        .rule_when("tinyint", TypeCondition::DisplayWidth(1), Boolean, LimitRule::None)
        .rule("bool", Boolean, LimitRule::None)
        .rule("boolean", Boolean, LimitRule::None)
        // Integers
        .rule("tinyint", Integer, Fixed(1))
        .rule("smallint", Integer, Fixed(2))
        .rule("mediumint", Integer, Fixed(3))
        .rule("int", Integer, Fixed(4))
        .rule("integer", Integer, Fixed(4))
        .rule("bigint", Integer, Fixed(8))
        .rule("year", Integer, LimitRule::None)
        // Fixed and floating point
        .rule("decimal", Decimal, LimitRule::None)
        .rule("numeric", Decimal, LimitRule::None)
        .rule("float", Float, LimitRule::None)
        .rule("double", Float, LimitRule::None)
        .rule("real", Float, LimitRule::None)
        // Character strings
        .rule("char", String, Declared)
        .rule("varchar", String, Declared)
        .rule("enum", String, LimitRule::None)
        .rule("set", String, LimitRule::None)
        .rule("tinytext", Text, Fixed(255))
        .rule("text", Text, Fixed(65_535))
        .rule("mediumtext", Text, Fixed(16_777_215))
        .rule("longtext", Text, Fixed(4_294_967_295))
        .rule("json", Text, LimitRule::None)
        // Temporal
        .rule("date", Date, LimitRule::None)
        .rule("datetime", Datetime, LimitRule::None)
        .rule("timestamp", Datetime, LimitRule::None)
        .rule("time", Time, LimitRule::None)
        // Binary
        .rule("binary", Binary, Declared)
        .rule("varbinary", Binary, Declared)
        .rule("tinyblob", Binary, Fixed(255))
        .rule("blob", Binary, Fixed(65_535))
        .rule("mediumblob", Binary, Fixed(16_777_215))
        .rule("longblob", Binary, Fixed(4_294_967_295))
        .rule("bit", Binary, LimitRule::None)
}
