//! Dialect type maps
//!
//! Each dialect declares an explicit table from native type names to a
//! semantic type and a limit rule. The resolver only ever consults the table,
//! so supporting another dialect means registering another map.

use crate::{CatalogColumn, Result, SchemaLensError, SemanticType};
use std::collections::HashMap;
use std::sync::Arc;

/// How a column's limit is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitRule {
    /// The type never carries a limit
    None,
    /// Limit is the declared length, e.g. `varchar(255)`
    Declared,
    /// Limit is fixed by the native type (storage tier capacity or byte width)
    Fixed(i64),
}

/// Extra condition a rule imposes on the full vendor type string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCondition {
    Always,
    /// First type argument equals the given width, e.g. `tinyint(1)`
    DisplayWidth(i64),
}

/// A single native type mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    pub native: &'static str,
    pub semantic: SemanticType,
    pub limit: LimitRule,
    pub condition: TypeCondition,
}

impl TypeRule {
    fn matches(&self, native: &str, arguments: &[i64]) -> bool {
        if self.native != native {
            return false;
        }
        match self.condition {
            TypeCondition::Always => true,
            TypeCondition::DisplayWidth(width) => arguments.first() == Some(&width),
        }
    }
}

/// Semantic interpretation of a catalog column's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub semantic_type: SemanticType,
    pub limit: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
}

/// Native type table for one dialect
#[derive(Debug, Clone)]
pub struct TypeMap {
    dialect: String,
    rules: Vec<TypeRule>,
    max_limit: Option<i64>,
}

impl TypeMap {
    /// Create an empty map for a dialect
    pub fn new(dialect: &str) -> Self {
        Self {
            dialect: dialect.to_string(),
            rules: Vec::new(),
            max_limit: None,
        }
    }

    /// Clamp every reported limit to this value
    pub fn max_limit(mut self, max: i64) -> Self {
        self.max_limit = Some(max);
        self
    }

    /// Map a native type unconditionally
    pub fn rule(self, native: &'static str, semantic: SemanticType, limit: LimitRule) -> Self {
        self.rule_when(native, TypeCondition::Always, semantic, limit)
    }

    /// Map a native type when the condition holds.
    ///
    /// Rules are tried in registration order, so conditional rules must be
    /// registered before the unconditional rule for the same native type.
    pub fn rule_when(
        mut self,
        native: &'static str,
        condition: TypeCondition,
        semantic: SemanticType,
        limit: LimitRule,
    ) -> Self {
        self.rules.push(TypeRule {
            native,
            semantic,
            limit,
            condition,
        });
        self
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Resolve a catalog column to its semantic type and normalized limit
    pub fn resolve(&self, column: &CatalogColumn) -> Result<ResolvedType> {
        let native = column.data_type.trim().to_lowercase();
        let arguments = type_arguments(&column.column_type);

        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(&native, &arguments))
            .ok_or_else(|| {
                tracing::warn!(
                    dialect = %self.dialect,
                    column = %column.name,
                    native_type = %column.column_type,
                    "no semantic mapping for native type"
                );
                SchemaLensError::UnsupportedType {
                    dialect: self.dialect.clone(),
                    native_type: if column.column_type.is_empty() {
                        column.data_type.clone()
                    } else {
                        column.column_type.clone()
                    },
                }
            })?;

        let limit = if rule.semantic.is_temporal() {
            None
        } else {
            match rule.limit {
                LimitRule::None => None,
                LimitRule::Declared => arguments
                    .first()
                    .copied()
                    .or(column.character_maximum_length),
                LimitRule::Fixed(n) => Some(n),
            }
        };
        let limit = match (limit, self.max_limit) {
            (Some(limit), Some(max)) => Some(limit.min(max)),
            (limit, _) => limit,
        };

        let (precision, scale) = if rule.semantic == SemanticType::Decimal {
            (
                column
                    .numeric_precision
                    .or_else(|| arguments.first().copied()),
                column.numeric_scale.or_else(|| arguments.get(1).copied()),
            )
        } else {
            (None, None)
        };

        Ok(ResolvedType {
            semantic_type: rule.semantic,
            limit,
            precision,
            scale,
        })
    }
}

/// Numeric arguments of a vendor type string: `decimal(15,2) unsigned` -> `[15, 2]`
pub fn type_arguments(column_type: &str) -> Vec<i64> {
    let Some(open) = column_type.find('(') else {
        return Vec::new();
    };
    let Some(close) = column_type[open..].find(')') else {
        return Vec::new();
    };
    column_type[open + 1..open + close]
        .split(',')
        .filter_map(|arg| arg.trim().parse::<i64>().ok())
        .collect()
}

/// Type maps keyed by dialect id
#[derive(Debug, Clone, Default)]
pub struct TypeMapRegistry {
    maps: HashMap<String, Arc<TypeMap>>,
}

impl TypeMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map under its own dialect id
    pub fn register(&mut self, map: TypeMap) -> Arc<TypeMap> {
        let map = Arc::new(map);
        tracing::debug!(dialect = %map.dialect(), rules = map.rules().len(), "registering type map");
        self.maps.insert(map.dialect().to_string(), map.clone());
        map
    }

    /// Register an existing map under an additional dialect id
    pub fn register_alias(&mut self, alias: &str, map: Arc<TypeMap>) {
        self.maps.insert(alias.to_string(), map);
    }

    pub fn get(&self, dialect: &str) -> Option<Arc<TypeMap>> {
        self.maps.get(dialect).cloned()
    }

    /// Like `get`, but a missing dialect is a configuration error
    pub fn require(&self, dialect: &str) -> Result<Arc<TypeMap>> {
        self.get(dialect).ok_or_else(|| {
            tracing::warn!(dialect = %dialect, "no type map registered for dialect");
            SchemaLensError::Configuration(format!("No type map registered for dialect '{}'", dialect))
        })
    }

    pub fn dialects(&self) -> Vec<&str> {
        let mut dialects: Vec<&str> = self.maps.keys().map(|s| s.as_str()).collect();
        dialects.sort_unstable();
        dialects
    }
}
