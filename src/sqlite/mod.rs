// SQLite collaborator - the engine's executor over rusqlite, plus the bb8 pool the async
// client draws connections from.
//
// - config: client options and the bb8 connection manager
// - connection: blocking-pool bridge for driver calls
// - params: argument conversion into rusqlite values
// - query: driver value extraction
// - executor: `Executor` implementation over a borrowed connection

pub mod config;
mod connection;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{ClientOptions, ClientOptionsBuilder, SharedSqliteConnection, SqliteManager};
pub(crate) use connection::run_blocking;
pub use executor::SqliteExecutor;
pub use params::Params;
