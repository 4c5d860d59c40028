//! Declarative result mapping on top of a SQL driver.
//!
//! Queries (or stored-procedure names) run through an [`executor::Executor`]; the
//! [`Engine`] turns the resulting rows into records, scalars, arrays of one column, keyed
//! maps, several result sets at once, or raw JSON.
//!
//! Records opt in with [`impl_record!`], naming the column each field is read from:
//!
//! ```rust
//! use sql_mapper::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Order {
//!     id: i64,
//!     customer: String,
//!     total: f64,
//!     shipped: bool,
//! }
//!
//! sql_mapper::impl_record!(Order {
//!     id => "id",
//!     customer => "customer",
//!     total => "total",
//!     shipped => "shipped",
//! });
//!
//! let db = MemoryExecutor::new().with_rows(
//!     "SELECT * FROM orders",
//!     ResultSet::from_rows(
//!         &["id", "customer", "total", "shipped"],
//!         vec![vec![
//!             RowValues::Int(1),
//!             RowValues::Null,
//!             RowValues::Float(9.5),
//!             RowValues::Int(1),
//!         ]],
//!     ),
//! );
//!
//! let engine = Engine::new();
//! let orders: Vec<Order> = engine.find(&db, "SELECT * FROM orders", &[])?;
//! assert_eq!(
//!     orders,
//!     vec![Order { id: 1, customer: String::new(), total: 9.5, shipped: true }]
//! );
//! # Ok::<(), SqlMapperError>(())
//! ```
//!
//! With the `sqlite` feature (on by default), [`Client`] runs the same operations
//! asynchronously over a pooled `SQLite` database, and [`global`] keeps one client for the
//! whole process.

pub mod engine;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod prelude;
pub mod results;
pub mod scan;
pub mod trace;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod client;
#[cfg(feature = "sqlite")]
pub mod global;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use engine::{
    CoercionPolicy, Engine, EngineBuilder, EngineOptions, JsonShape, MapKey, MapStrategy,
    MapValue, ResultTarget, SqlElement,
};
pub use error::{Result, SqlMapperError};
pub use mapping::{ColumnValue, FieldDescriptor, Record, TypeMappingCache};
pub use results::{CustomDbRow, ResultSet};
pub use scan::ScanTarget;
pub use types::{FieldKind, RowValues};

#[cfg(feature = "sqlite")]
pub use client::Client;
#[cfg(feature = "sqlite")]
pub use sqlite::{ClientOptions, ClientOptionsBuilder};
