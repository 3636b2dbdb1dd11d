//! A Rust library for flattening ODK-style survey submissions into
//! schema-aligned tabular exports.

pub mod async_io;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod instance;
pub mod loader;
pub mod schema;

// Re-export the most common types for easier use
// Core types
pub use config::{ExportConfig, ExportMode, MetaPosition};
pub use error::{ExportError, Result, SchemaError, UnknownFieldWarning};
pub use instance::{Instance, InstanceNode};
pub use schema::{FieldKind, FormSchema, ResolvedSchema, SchemaNode, resolve_headers};

// Flattening and export
pub use export::Exporter;
pub use flatten::{Cell, FlatRow, Flattener, flatten_nested};

// Loading
pub use async_io::load_instances_async;
pub use loader::{load_instance, load_instances_parallel, load_schema};

// Arrow types
pub use arrow::record_batch::RecordBatch;
