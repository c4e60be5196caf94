//! schemalens core - catalog abstractions for schema introspection
//!
//! This crate provides the traits and types every driver builds on:
//!
//! - `Catalog` - a live session answering primitive catalog queries
//! - `TypeMap` - per-dialect table from native types to semantic types
//! - `SchemaMetadataResolver` - primary keys, column descriptors and dumps
//! - `DatabaseDriver` - opens catalog sessions from a `ConnectionConfig`

mod catalog;
mod config;
mod driver;
pub mod dump;
mod error;
mod resolver;
mod schema;
mod type_map;

#[cfg(test)]
mod test_support;

pub use catalog::*;
pub use config::*;
pub use driver::*;
pub use error::*;
pub use resolver::*;
pub use schema::*;
pub use type_map::*;
