pub mod memory;
pub mod predicate;
pub mod rest;

pub use memory::MemoryStore;
pub use predicate::Predicate;
pub use rest::RestStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::InsertEvent;

/// Backend table names.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const SWIPES: &str = "swipes";
    pub const MATCHES: &str = "matches";
}

/// The backend seam. Everything the session core needs from the hosted
/// backend goes through this trait; rows travel as raw JSON and are decoded
/// at the call site.
#[async_trait]
pub trait DataAccess: Send + Sync + 'static {
    /// Fetch every row of `table` matching `filter`.
    async fn query(&self, table: &str, filter: &Predicate) -> AppResult<Vec<Value>>;

    /// Fetch exactly one row. Zero rows is `RowNotFound`, more than one is
    /// `AmbiguousRow`.
    async fn query_one(&self, table: &str, filter: &Predicate) -> AppResult<Value>;

    /// Append a row.
    async fn insert(&self, table: &str, row: Value) -> AppResult<()>;

    /// Insert or replace, resolving conflicts on `conflict_key`.
    async fn upsert(&self, table: &str, row: Value, conflict_key: &str) -> AppResult<()>;

    /// Remove the row whose `id` column equals `id`.
    async fn delete_by_id(&self, table: &str, id: Uuid) -> AppResult<()>;

    /// Stream insert notifications for rows of `table` whose `filter_column`
    /// equals `value`.
    async fn subscribe_inserts(
        &self,
        table: &str,
        filter_column: &str,
        value: Value,
    ) -> AppResult<Subscription>;
}

/// Handle on a realtime insert stream.
///
/// Dropping the handle or calling [`Subscription::close`] releases the
/// channel; no further events are delivered afterwards.
pub struct Subscription {
    rx: Option<mpsc::Receiver<InsertEvent>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<InsertEvent>) -> Self {
        Self { rx: Some(rx), task: None }
    }

    /// A subscription backed by a pump task that must be aborted on release.
    pub fn with_task(rx: mpsc::Receiver<InsertEvent>, task: tokio::task::JoinHandle<()>) -> Self {
        Self {
            rx: Some(rx),
            task: Some(task),
        }
    }

    /// Next event, or `None` once the subscription is closed or the
    /// producer side went away.
    pub async fn recv(&mut self) -> Option<InsertEvent> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Decode rows leniently: rows that fail to decode are skipped with a
/// warning instead of failing the whole batch.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "skipping row that failed to decode");
                None
            }
        })
        .collect()
}

pub(crate) fn single_row(table: &str, mut rows: Vec<Value>) -> AppResult<Value> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(AppError::row_not_found(format!("no row matched in {table}"))),
        n => Err(AppError::new(
            ErrorCode::AmbiguousRow,
            format!("{n} rows matched in {table}, expected one"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_row_taxonomy() {
        assert!(single_row("profiles", vec![json!({"id": 1})]).is_ok());

        let err = single_row("profiles", vec![]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RowNotFound);

        let err = single_row("profiles", vec![json!({}), json!({})]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AmbiguousRow);
    }

    #[test]
    fn decode_rows_skips_bad_rows() {
        let rows = vec![
            json!({ "id": "0b1f8f6e-9a55-4a5e-9c2e-0c1b6f5a7d10" }),
            json!({ "full_name": "no id here" }),
        ];
        let profiles: Vec<crate::types::Profile> = decode_rows(rows);
        assert_eq!(profiles.len(), 1);
    }
}
