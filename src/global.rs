//! Process-wide client handle.
//!
//! The handle starts empty. [`connect`] or [`install`] sets it, [`shutdown`] clears it; every
//! forwarding function fails with `ConfigError` while it is empty. Prefer passing a
//! [`Client`] explicitly where possible.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use crate::client::Client;
use crate::engine::{JsonShape, MapKey, MapValue, ResultTarget, SqlElement};
use crate::error::{Result, SqlMapperError};
use crate::executor::QueryText;
use crate::mapping::{ColumnValue, Record};
use crate::sqlite::ClientOptions;
use crate::types::RowValues;

static GLOBAL_CLIENT: LazyLock<RwLock<Option<Client>>> = LazyLock::new(|| RwLock::new(None));

/// Connect a client and install it as the process-wide handle.
///
/// # Errors
/// Returns the connection error; the previous handle, if any, stays installed then.
pub async fn connect(options: ClientOptions) -> Result<Client> {
    let client = Client::connect(options).await?;
    install(client.clone());
    Ok(client)
}

/// Install `client` as the process-wide handle, returning the one it replaces.
pub fn install(client: Client) -> Option<Client> {
    GLOBAL_CLIENT
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .replace(client)
}

/// The installed client.
///
/// # Errors
/// Returns `ConfigError` if nothing is installed.
pub fn client() -> Result<Client> {
    GLOBAL_CLIENT
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
        .ok_or_else(|| {
            SqlMapperError::ConfigError(
                "global client is not initialized; call global::connect first".into(),
            )
        })
}

#[must_use]
pub fn is_connected() -> bool {
    GLOBAL_CLIENT
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .is_some()
}

/// Remove the process-wide handle. The pool closes once the last clone of the returned
/// client is dropped.
pub fn shutdown() -> Option<Client> {
    GLOBAL_CLIENT
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take()
}

/// # Errors
/// See [`Client::find`].
pub async fn find<'q, R: Record>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
) -> Result<Vec<R>> {
    client()?.find(query, args).await
}

/// # Errors
/// See [`Client::find_into`].
pub async fn find_into<'q, R: Record>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    dest: &mut Vec<R>,
) -> Result<()> {
    client()?.find_into(query, args, dest).await
}

/// # Errors
/// See [`Client::first`].
pub async fn first<'q, R: Record>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    dest: &mut R,
) -> Result<bool> {
    client()?.first(query, args, dest).await
}

/// # Errors
/// See [`Client::first_col`].
pub async fn first_col<'q, T: ColumnValue>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    dest: &mut T,
) -> Result<bool> {
    client()?.first_col(query, args, dest).await
}

/// # Errors
/// See [`Client::first_col_any`].
pub async fn first_col_any<'q, T: SqlElement>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
) -> Result<Option<T>> {
    client()?.first_col_any(query, args).await
}

/// # Errors
/// See [`Client::find_array`].
pub async fn find_array<'q, T: SqlElement>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    field: &str,
) -> Result<Option<Vec<T>>> {
    client()?.find_array(query, args, field).await
}

/// # Errors
/// See [`Client::find_map`].
pub async fn find_map<'q, K: MapKey, V: MapValue>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    key_field: &str,
    value_field: &str,
) -> Result<Option<HashMap<K, V>>> {
    client()?
        .find_map(query, args, key_field, value_field)
        .await
}

/// # Errors
/// See [`Client::find_multiple`].
pub async fn find_multiple<'q>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    targets: &mut [ResultTarget<'_>],
) -> Result<()> {
    client()?.find_multiple(query, args, targets).await
}

/// # Errors
/// See [`Client::exec`].
pub async fn exec<'q>(query: impl Into<QueryText<'q>>, args: &[RowValues]) -> Result<bool> {
    client()?.exec(query, args).await
}

/// # Errors
/// See [`Client::exec_last_id`].
pub async fn exec_last_id<'q>(query: impl Into<QueryText<'q>>, args: &[RowValues]) -> Result<i64> {
    client()?.exec_last_id(query, args).await
}

/// # Errors
/// See [`Client::exec_json`].
pub async fn exec_json<'q>(
    query: impl Into<QueryText<'q>>,
    args: &[RowValues],
    shape: JsonShape,
) -> Result<Vec<u8>> {
    client()?.exec_json(query, args, shape).await
}
