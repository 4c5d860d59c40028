//! The result-materialization engine.
//!
//! Cursor-level operations (`materialize_*`, [`Engine::dispatch`], [`Engine::scalar_any`],
//! [`Engine::column_array`], [`Engine::column_map`], [`Engine::project_json`]) work on any
//! [`RowCursor`](crate::executor::RowCursor). Executor-level operations (`find`, `first`,
//! `find_map`, `exec`, ...) render the query, trace it, prepare and run it through an
//! [`Executor`](crate::executor::Executor) and release the statement and cursor before
//! returning.

mod dispatch;
mod exec;
mod materialize;
mod projection;
mod retrieval;

use std::fmt;
use std::sync::Arc;

pub use dispatch::ResultTarget;
pub(crate) use dispatch::require_targets;
pub use projection::JsonShape;
pub use retrieval::{Coerced, MapKey, MapStrategy, MapValue, SqlElement};

use crate::mapping::TypeMappingCache;
use crate::trace::{TraceSink, TracingSink};
use crate::types::RowValues;

/// What map retrieval does with a key or value that cannot be parsed into the requested type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoercionPolicy {
    /// Drop rows with an unparseable key, store the zero value for an unparseable value, and
    /// log both at `warn`.
    #[default]
    Skip,
    /// Report a column mismatch.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub coercion: CoercionPolicy,
}

/// Shared, thread-safe mapping engine. One instance owns one type-mapping cache.
pub struct Engine {
    cache: TypeMappingCache,
    trace: Option<Arc<dyn TraceSink>>,
    options: EngineOptions,
}

impl Engine {
    /// Engine with default options and no trace sink.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn cache(&self) -> &TypeMappingCache {
        &self.cache
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub(crate) fn trace_query(&self, query: &str, args: &[RowValues]) {
        if let Some(sink) = &self.trace {
            sink.trace(query, args);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("cache", &self.cache)
            .field("tracing", &self.trace.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Fluent builder for [`Engine`].
#[derive(Default, Clone)]
pub struct EngineBuilder {
    trace: Option<Arc<dyn TraceSink>>,
    options: EngineOptions,
}

impl EngineBuilder {
    /// Install a trace sink.
    #[must_use]
    pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Install (or remove) the [`TracingSink`].
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.trace = enabled.then(|| Arc::new(TracingSink) as Arc<dyn TraceSink>);
        self
    }

    #[must_use]
    pub fn coercion(mut self, policy: CoercionPolicy) -> Self {
        self.options.coercion = policy;
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            cache: TypeMappingCache::new(),
            trace: self.trace,
            options: self.options,
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("tracing", &self.trace.is_some())
            .field("options", &self.options)
            .finish()
    }
}
