use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::types::InsertEvent;

use super::{single_row, DataAccess, Predicate, Subscription};

const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Debug)]
struct Subscriber {
    table: String,
    column: String,
    value: Value,
    tx: mpsc::Sender<InsertEvent>,
}

#[derive(Default, Debug)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    subscribers: Vec<Subscriber>,
}

/// In-memory [`DataAccess`] implementation.
///
/// Backs every test in the workspace and session-scoped demos. Inserts fan
/// out to subscribers whose (table, column, value) filter matches the new
/// row, mirroring the backend's realtime channel.
#[derive(Default, Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of rows currently held for `table`. Test helper.
    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl DataAccess for MemoryStore {
    async fn query(&self, table: &str, filter: &Predicate) -> AppResult<Vec<Value>> {
        let inner = self.lock();
        let rows = inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        Ok(rows)
    }

    async fn query_one(&self, table: &str, filter: &Predicate) -> AppResult<Value> {
        let rows = self.query(table, filter).await?;
        single_row(table, rows)
    }

    async fn insert(&self, table: &str, row: Value) -> AppResult<()> {
        let targets: Vec<mpsc::Sender<InsertEvent>> = {
            let mut inner = self.lock();
            inner
                .tables
                .entry(table.to_string())
                .or_default()
                .push(row.clone());
            inner.subscribers.retain(|s| !s.tx.is_closed());
            inner
                .subscribers
                .iter()
                .filter(|s| s.table == table && row.get(&s.column) == Some(&s.value))
                .map(|s| s.tx.clone())
                .collect()
        };

        if !targets.is_empty() {
            let event = InsertEvent::new(table, row);
            for tx in targets {
                let _ = tx.send(event.clone()).await;
            }
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value, conflict_key: &str) -> AppResult<()> {
        let mut inner = self.lock();
        let rows = inner.tables.entry(table.to_string()).or_default();
        let key = row.get(conflict_key).cloned();
        match rows
            .iter_mut()
            .find(|existing| key.is_some() && existing.get(conflict_key) == key.as_ref())
        {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> AppResult<()> {
        let id_value = Value::String(id.to_string());
        let mut inner = self.lock();
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|row| row.get("id") != Some(&id_value));
        }
        Ok(())
    }

    async fn subscribe_inserts(
        &self,
        table: &str,
        filter_column: &str,
        value: Value,
    ) -> AppResult<Subscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.lock().subscribers.push(Subscriber {
            table: table.to_string(),
            column: filter_column.to_string(),
            value,
            tx,
        });
        Ok(Subscription::new(rx))
    }
}
