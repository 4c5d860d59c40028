use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::ManageConnection;

use super::connection::run_blocking;
use crate::client::Client;
use crate::engine::CoercionPolicy;
use crate::error::{Result, SqlMapperError};

/// One pooled `SQLite` connection, shared with the blocking pool through an async mutex.
pub type SharedSqliteConnection = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

/// Options for connecting a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Database file path. Every pooled connection opens this path, so `:memory:` gives each
    /// connection its own private database.
    pub db_path: String,
    pub max_open_conns: u32,
    /// Idle connections the pool keeps open; `None` lets the pool drain to zero.
    pub min_idle_conns: Option<u32>,
    /// Idle connections above `min_idle_conns` are closed after this long; `None` keeps them.
    pub idle_timeout: Option<Duration>,
    /// `None` keeps connections forever.
    pub conn_max_lifetime: Option<Duration>,
    /// How long a checkout may wait for a free connection.
    pub connection_timeout: Duration,
    /// Apply `PRAGMA journal_mode = WAL` to each new connection.
    pub wal: bool,
    /// Log every query through the `tracing` sink.
    pub debug: bool,
    pub coercion: CoercionPolicy,
}

impl ClientOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_open_conns: 100,
            min_idle_conns: None,
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            conn_max_lifetime: Some(Duration::from_secs(4 * 60 * 60)),
            connection_timeout: Duration::from_secs(30),
            wal: true,
            debug: false,
            coercion: CoercionPolicy::Skip,
        }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(db_path)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.db_path.is_empty() {
            return Err(SqlMapperError::ConfigError("db_path must not be empty".into()));
        }
        if self.max_open_conns == 0 {
            return Err(SqlMapperError::ConfigError(
                "max_open_conns must be at least 1".into(),
            ));
        }
        if self.min_idle_conns.is_some_and(|idle| idle > self.max_open_conns) {
            return Err(SqlMapperError::ConfigError(
                "min_idle_conns must not exceed max_open_conns".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ClientOptions`].
#[derive(Debug, Clone)]
pub struct ClientOptionsBuilder {
    opts: ClientOptions,
}

impl ClientOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: ClientOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_open_conns(mut self, max: u32) -> Self {
        self.opts.max_open_conns = max;
        self
    }

    #[must_use]
    pub fn min_idle_conns(mut self, idle: Option<u32>) -> Self {
        self.opts.min_idle_conns = idle;
        self
    }

    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn conn_max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.opts.conn_max_lifetime = lifetime;
        self
    }

    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connection_timeout = timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.opts.debug = debug;
        self
    }

    #[must_use]
    pub fn coercion(mut self, policy: CoercionPolicy) -> Self {
        self.opts.coercion = policy;
        self
    }

    #[must_use]
    pub fn finish(self) -> ClientOptions {
        self.opts
    }

    /// Connect a [`Client`] with these options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid options, or the error from opening the first
    /// connection.
    pub async fn build(self) -> Result<Client> {
        Client::connect(self.finish()).await
    }
}

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
    wal: bool,
}

impl SqliteManager {
    #[must_use]
    pub fn new(db_path: impl Into<String>, wal: bool) -> Self {
        Self {
            db_path: db_path.into(),
            wal,
        }
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlMapperError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let db_path = self.db_path.clone();
        let wal = self.wal;
        async move {
            let conn = tokio::task::spawn_blocking(move || {
                let conn = rusqlite::Connection::open(&db_path)?;
                if wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                Ok::<_, SqlMapperError>(conn)
            })
            .await
            .map_err(|e| {
                SqlMapperError::ConnectionError(format!("sqlite connect join error: {e}"))
            })??;
            Ok(Arc::new(tokio::sync::Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            run_blocking(handle, |guard| {
                guard.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
