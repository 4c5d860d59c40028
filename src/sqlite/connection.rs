use crate::error::{Result, SqlMapperError};

use super::config::SharedSqliteConnection;

/// Run `func` against the shared connection on tokio's blocking pool.
pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlMapperError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
