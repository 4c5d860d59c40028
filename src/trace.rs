//! Optional hook invoked with the final query text and arguments before execution.

use crate::types::RowValues;

/// Receives every query right before it runs. Implementations must not fail or block for long;
/// there is no way for a sink to abort the query.
pub trait TraceSink: Send + Sync {
    fn trace(&self, query: &str, args: &[RowValues]);
}

impl<F> TraceSink for F
where
    F: Fn(&str, &[RowValues]) + Send + Sync,
{
    fn trace(&self, query: &str, args: &[RowValues]) {
        self(query, args);
    }
}

/// Emits each query as a `tracing` event on the `sql` target at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&self, query: &str, args: &[RowValues]) {
        tracing::info!(target: "sql", "sql:{query}, args:[{}]", render_args(args));
    }
}

fn render_args(args: &[RowValues]) -> String {
    args.iter()
        .map(|arg| match arg {
            RowValues::Int(i) => i.to_string(),
            RowValues::Float(f) => f.to_string(),
            RowValues::Text(s) => s.clone(),
            RowValues::Bool(b) => b.to_string(),
            RowValues::Timestamp(ts) => crate::scan::format_timestamp(ts),
            RowValues::Null => "NULL".to_string(),
            RowValues::JSON(j) => j.to_string(),
            RowValues::Blob(b) => format!("<{} bytes>", b.len()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
