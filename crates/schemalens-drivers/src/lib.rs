//! schemalens drivers - driver registry and runtime glue
//!
//! This crate wires the concrete drivers to the traits defined in
//! `schemalens-core` and offers a blocking surface for synchronous callers.

#[cfg(feature = "mysql")]
pub use schemalens_driver_mysql as mysql;

mod blocking;
mod registry;
mod runtime;

pub use blocking::BlockingResolver;
pub use registry::DriverRegistry;
pub use runtime::{block_on_tokio, get_tokio_runtime};

/// Re-export commonly used types from schemalens-core
pub use schemalens_core::{
    Catalog, ColumnDescriptor, ConnectionConfig, DatabaseDriver, Result, SchemaLensError,
    SchemaMetadataResolver, SemanticType, TableDescriptor, TypeMap, TypeMapRegistry,
};
