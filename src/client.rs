//! Async client over a bb8 pool of `SQLite` connections.
//!
//! Driver work (prepare, execute, row fetch) runs on tokio's blocking pool. Row-returning
//! operations copy the result sets into a [`BufferedCursor`], hand the connection back, and
//! then run the engine on the calling task, so destinations can be plain borrows.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bb8::Pool;

use crate::engine::{Engine, JsonShape, MapKey, MapValue, ResultTarget, SqlElement};
use crate::error::Result;
use crate::executor::{BufferedCursor, Executor, QueryText};
use crate::mapping::{ColumnValue, Record};
use crate::sqlite::{ClientOptions, SqliteExecutor, SqliteManager, run_blocking};
use crate::types::RowValues;

/// Cloneable handle: a connection pool plus the engine that maps its results.
#[derive(Clone)]
pub struct Client {
    pool: Pool<SqliteManager>,
    engine: Arc<Engine>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("pool", &self.pool.state())
            .field("engine", &self.engine)
            .finish()
    }
}

impl Client {
    /// Build the pool and open the first connection.
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid options, or the driver error if the smoke-test
    /// connection cannot be opened.
    pub async fn connect(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let engine = Engine::builder()
            .debug(options.debug)
            .coercion(options.coercion)
            .build();
        let pool = Pool::builder()
            .max_size(options.max_open_conns)
            .min_idle(options.min_idle_conns)
            .idle_timeout(options.idle_timeout)
            .max_lifetime(options.conn_max_lifetime)
            .connection_timeout(options.connection_timeout)
            .build(SqliteManager::new(options.db_path, options.wal))
            .await?;
        let client = Self {
            pool,
            engine: Arc::new(engine),
        };
        client
            .with_connection(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await?;
        tracing::debug!(max_open_conns = options.max_open_conns, "sqlite pool ready");
        Ok(client)
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<SqliteManager> {
        &self.pool
    }

    /// Run `func` with exclusive access to one pooled connection, e.g. for a transaction.
    ///
    /// # Errors
    /// Returns pool checkout errors or whatever `func` returns.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.pool.get().await?;
        let handle = Arc::clone(&*conn);
        let out = run_blocking(handle, func).await;
        drop(conn);
        out
    }

    async fn fetch(&self, query: QueryText<'_>, args: &[RowValues]) -> Result<BufferedCursor> {
        let sql = query.render(args.len()).into_owned();
        self.engine.trace_query(&sql, args);
        let args = args.to_vec();
        self.with_connection(move |conn| {
            let executor = SqliteExecutor::new(conn);
            let mut statement = executor.prepare(&sql)?;
            let mut cursor = statement.query(&args)?;
            let buffered = BufferedCursor::drain(cursor.as_mut());
            drop(cursor);
            drop(statement);
            buffered
        })
        .await
    }

    /// See [`Engine::find`].
    ///
    /// # Errors
    /// Returns driver, pool and conversion errors.
    pub async fn find<'q, R: Record>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<Vec<R>> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.materialize_many(&mut cursor)
    }

    /// See [`Engine::find_into`].
    ///
    /// # Errors
    /// Returns driver, pool and conversion errors; `dest` is untouched then.
    pub async fn find_into<'q, R: Record>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut Vec<R>,
    ) -> Result<()> {
        *dest = self.find(query, args).await?;
        Ok(())
    }

    /// See [`Engine::first`].
    ///
    /// # Errors
    /// Returns driver, pool and conversion errors.
    pub async fn first<'q, R: Record>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut R,
    ) -> Result<bool> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.materialize_one(&mut cursor, dest)
    }

    /// See [`Engine::first_col`].
    ///
    /// # Errors
    /// Returns driver and pool errors, and the errors of [`Engine::materialize_scalar`].
    pub async fn first_col<'q, T: ColumnValue>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        dest: &mut T,
    ) -> Result<bool> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.materialize_scalar(&mut cursor, dest)
    }

    /// See [`Engine::first_col_any`].
    ///
    /// # Errors
    /// Returns driver and pool errors, and the errors of [`Engine::scalar_any`].
    pub async fn first_col_any<'q, T: SqlElement>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<Option<T>> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.scalar_any(&mut cursor)
    }

    /// See [`Engine::find_array`].
    ///
    /// # Errors
    /// Returns driver and pool errors, and the errors of [`Engine::column_array`].
    pub async fn find_array<'q, T: SqlElement>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        field: &str,
    ) -> Result<Option<Vec<T>>> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.column_array(&mut cursor, field)
    }

    /// See [`Engine::find_map`].
    ///
    /// # Errors
    /// Returns driver and pool errors, and the errors of [`Engine::column_map`].
    pub async fn find_map<'q, K: MapKey, V: MapValue>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        key_field: &str,
        value_field: &str,
    ) -> Result<Option<HashMap<K, V>>> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.column_map(&mut cursor, key_field, value_field)
    }

    /// See [`Engine::find_multiple`].
    ///
    /// # Errors
    /// Returns driver and pool errors, and the errors of [`Engine::dispatch`].
    pub async fn find_multiple<'q>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        targets: &mut [ResultTarget<'_>],
    ) -> Result<()> {
        crate::engine::require_targets(targets)?;
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.dispatch(&mut cursor, targets)
    }

    /// See [`Engine::exec`].
    ///
    /// # Errors
    /// Returns driver and pool errors.
    pub async fn exec<'q>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<bool> {
        let sql = query.into().render(args.len()).into_owned();
        let engine = Arc::clone(&self.engine);
        let args = args.to_vec();
        self.with_connection(move |conn| engine.exec(&SqliteExecutor::new(conn), sql, &args))
            .await
    }

    /// See [`Engine::exec_last_id`].
    ///
    /// # Errors
    /// Returns driver and pool errors.
    pub async fn exec_last_id<'q>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
    ) -> Result<i64> {
        let sql = query.into().render(args.len()).into_owned();
        let engine = Arc::clone(&self.engine);
        let args = args.to_vec();
        self.with_connection(move |conn| {
            engine.exec_last_id(&SqliteExecutor::new(conn), sql, &args)
        })
        .await
    }

    /// See [`Engine::exec_json`].
    ///
    /// # Errors
    /// Returns driver and pool errors, or a `SerializationError`.
    pub async fn exec_json<'q>(
        &self,
        query: impl Into<QueryText<'q>>,
        args: &[RowValues],
        shape: JsonShape,
    ) -> Result<Vec<u8>> {
        let mut cursor = self.fetch(query.into(), args).await?;
        self.engine.project_json(&mut cursor, shape)
    }
}
