// PostgREST-dialect store over reqwest.
//
//   GET    /rest/v1/{table}?select=*&{filters}      read
//   POST   /rest/v1/{table}                          insert (Prefer: return=minimal)
//   POST   /rest/v1/{table}?on_conflict={key}        upsert (Prefer: resolution=merge-duplicates)
//   DELETE /rest/v1/{table}?id=eq.{id}               delete
//   GET    /realtime/v1/{table}?{column}=eq.{value}  SSE insert stream
//
// Every request carries the project API key twice, as `apikey` and as a
// bearer token. The realtime endpoint speaks Server-Sent Events; each
// `event: INSERT` frame carries the inserted row as its `data:` payload.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::InsertEvent;

use super::predicate::render_scalar;
use super::{single_row, DataAccess, Predicate, Subscription};

const SUBSCRIPTION_BUFFER: usize = 64;

/// [`DataAccess`] implementation backed by the hosted backend's REST and
/// realtime endpoints.
#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn realtime_url(&self, table: &str) -> String {
        format!("{}/realtime/v1/{table}", self.base_url)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn check_status(
        response: &reqwest::Response,
        code: ErrorCode,
        table: &str,
        verb: &str,
    ) -> AppResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::new(
                code,
                format!("{verb} on {table} failed with status {status}"),
            ))
        }
    }
}

#[async_trait]
impl DataAccess for RestStore {
    async fn query(&self, table: &str, filter: &Predicate) -> AppResult<Vec<Value>> {
        let mut url = format!("{}?select=*", self.rest_url(table));
        if !filter.is_empty() {
            url.push('&');
            url.push_str(&filter.to_query_string());
        }

        let response = self.authed(self.http.get(&url)).send().await?;
        Self::check_status(&response, ErrorCode::QueryFailed, table, "query")?;
        Ok(response.json().await?)
    }

    async fn query_one(&self, table: &str, filter: &Predicate) -> AppResult<Value> {
        let rows = self.query(table, filter).await?;
        single_row(table, rows)
    }

    async fn insert(&self, table: &str, row: Value) -> AppResult<()> {
        let response = self
            .authed(self.http.post(self.rest_url(table)))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check_status(&response, ErrorCode::InsertFailed, table, "insert")
    }

    async fn upsert(&self, table: &str, row: Value, conflict_key: &str) -> AppResult<()> {
        let url = format!("{}?on_conflict={conflict_key}", self.rest_url(table));
        let response = self
            .authed(self.http.post(&url))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await?;
        Self::check_status(&response, ErrorCode::UpsertFailed, table, "upsert")
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> AppResult<()> {
        let url = format!("{}?id=eq.{id}", self.rest_url(table));
        let response = self.authed(self.http.delete(&url)).send().await?;
        Self::check_status(&response, ErrorCode::DeleteFailed, table, "delete")
    }

    async fn subscribe_inserts(
        &self,
        table: &str,
        filter_column: &str,
        value: Value,
    ) -> AppResult<Subscription> {
        let url = format!(
            "{}?{filter_column}=eq.{}",
            self.realtime_url(table),
            render_scalar(&value)
        );
        let response = self
            .authed(self.http.get(&url))
            .header("Accept", "text/event-stream")
            .send()
            .await?;
        Self::check_status(&response, ErrorCode::TransportError, table, "subscribe")?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let table = table.to_string();
        let task = tokio::spawn(async move {
            let events = insert_event_stream(response.bytes_stream(), table);
            tokio::pin!(events);
            while let Some(event) = events.next().await {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });
        Ok(Subscription::with_task(rx, task))
    }
}

// --- SSE consumption ---

/// One parsed Server-Sent Events frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Parse a single frame (the text between two blank lines).
///
/// Comment lines (leading `:`) are skipped; multiple `data:` lines are
/// joined with newlines per the SSE wire format. Frames with no data
/// produce `None`.
pub fn parse_sse_frame(frame: &str) -> Option<SseFrame> {
    let mut parsed = SseFrame::default();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            parsed.event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("id:") {
            parsed.id = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    parsed.data = data_lines.join("\n");
    Some(parsed)
}

/// Fold an `event: INSERT` frame into an [`InsertEvent`] for `table`.
/// Non-insert frames and frames whose data is not valid JSON are dropped.
pub fn frame_to_insert_event(frame: &SseFrame, table: &str) -> Option<InsertEvent> {
    if frame.event.as_deref() != Some("INSERT") {
        return None;
    }
    let row: Value = match serde_json::from_str(&frame.data) {
        Ok(row) => row,
        Err(e) => {
            warn!(error = %e, table, "dropping insert frame with invalid payload");
            return None;
        }
    };
    Some(match &frame.id {
        Some(id) => InsertEvent::with_id(id, table, row),
        None => InsertEvent::new(table, row),
    })
}

/// Turn a stream of raw byte chunks into a stream of [`InsertEvent`]s.
///
/// Chunks may split frames at arbitrary points; a frame is complete once a
/// blank line arrives. The stream ends when the transport does.
fn insert_event_stream<S, B, E>(chunks: S, table: String) -> impl Stream<Item = InsertEvent>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut buf = String::new();
        tokio::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    buf.push_str(&String::from_utf8_lossy(bytes.as_ref()).replace("\r\n", "\n"));
                    while let Some(end) = buf.find("\n\n") {
                        let frame: String = buf.drain(..end + 2).collect();
                        if let Some(event) = parse_sse_frame(&frame)
                            .as_ref()
                            .and_then(|f| frame_to_insert_event(f, &table))
                        {
                            yield event;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, table, "realtime stream interrupted");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use serde_json::json;

    #[test]
    fn parses_a_full_frame() {
        let frame = parse_sse_frame(
            "event: INSERT\nid: evt_42\ndata: {\"direction\":\"right\"}",
        )
        .unwrap();
        assert_eq!(frame.event.as_deref(), Some("INSERT"));
        assert_eq!(frame.id.as_deref(), Some("evt_42"));
        assert_eq!(frame.data, "{\"direction\":\"right\"}");
    }

    #[test]
    fn joins_multi_line_data_and_skips_comments() {
        let frame = parse_sse_frame(": heartbeat\ndata: line one\ndata: line two").unwrap();
        assert_eq!(frame.data, "line one\nline two");
        assert_eq!(frame.event, None);
    }

    #[test]
    fn frame_without_data_is_dropped() {
        assert_eq!(parse_sse_frame("event: INSERT\nid: evt_1"), None);
        assert_eq!(parse_sse_frame(": heartbeat"), None);
    }

    #[test]
    fn only_insert_frames_become_events() {
        let insert = SseFrame {
            event: Some("INSERT".into()),
            id: Some("evt_7".into()),
            data: "{\"swiped_id\":\"v\"}".into(),
        };
        let event = frame_to_insert_event(&insert, "swipes").unwrap();
        assert_eq!(event.id, "evt_7");
        assert_eq!(event.table, "swipes");
        assert_eq!(event.row, json!({ "swiped_id": "v" }));

        let other = SseFrame {
            event: Some("UPDATE".into()),
            data: "{}".into(),
            ..Default::default()
        };
        assert!(frame_to_insert_event(&other, "swipes").is_none());

        let garbage = SseFrame {
            event: Some("INSERT".into()),
            data: "not json".into(),
            ..Default::default()
        };
        assert!(frame_to_insert_event(&garbage, "swipes").is_none());
    }

    #[tokio::test]
    async fn event_stream_reassembles_split_frames() {
        let chunks: Vec<Result<&[u8], AppError>> = vec![
            Ok(b"event: INSERT\ndata: {\"di"),
            Ok(b"rection\":\"right\"}\n\n: heartbeat\n\nevent: INSERT\n"),
            Ok(b"data: {\"direction\":\"left\"}\n\n"),
        ];
        let events: Vec<InsertEvent> =
            insert_event_stream(futures::stream::iter(chunks), "swipes".into())
                .collect()
                .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].row, json!({ "direction": "right" }));
        assert_eq!(events[1].row, json!({ "direction": "left" }));
    }

    #[tokio::test]
    async fn event_stream_ends_on_transport_error() {
        let chunks: Vec<Result<&[u8], AppError>> = vec![
            Ok(b"event: INSERT\ndata: {}\n\n"),
            Err(AppError::internal("connection reset")),
            Ok(b"event: INSERT\ndata: {}\n\n"),
        ];
        let events: Vec<InsertEvent> =
            insert_event_stream(futures::stream::iter(chunks), "swipes".into())
                .collect()
                .await;
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn urls_and_headers_shape() {
        let store = RestStore::new("https://proj.example.co/", "anon-key");
        assert_eq!(store.rest_url("profiles"), "https://proj.example.co/rest/v1/profiles");
        assert_eq!(
            store.realtime_url("swipes"),
            "https://proj.example.co/realtime/v1/swipes"
        );
    }
}
