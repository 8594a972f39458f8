use std::collections::HashSet;
use std::sync::Arc;

use cocotas_shared::data::{decode_rows, tables};
use cocotas_shared::{DataAccess, Direction, NewSwipeDecision, Predicate};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::SessionContext;

/// Live count of people who right-swiped the viewer and have not been
/// swiped on back.
///
/// The initial value comes from two queries and a set difference; after
/// that, a realtime subscription filtered on `swiped_id = viewer` feeds a
/// fold task that bumps the count once per qualifying insert. The count is
/// exposed through a `watch` channel.
///
/// A swipe landing between the initial query and the subscription start can
/// be counted zero or two times; the window is accepted as-is.
pub struct LikeCounter {
    rx: watch::Receiver<u64>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl LikeCounter {
    pub async fn start<D: DataAccess>(ctx: &SessionContext<D>) -> Self {
        Self::start_with(Arc::clone(&ctx.data), ctx.viewer_id).await
    }

    pub async fn start_with<D: DataAccess>(data: Arc<D>, viewer_id: Uuid) -> Self {
        let initial = initial_count(&*data, viewer_id).await;
        let (tx, rx) = watch::channel(initial);

        let task = match data
            .subscribe_inserts(tables::SWIPES, "swiped_id", json!(viewer_id))
            .await
        {
            Ok(mut subscription) => Some(tokio::spawn(async move {
                while let Some(event) = subscription.recv().await {
                    match event.decode::<NewSwipeDecision>() {
                        Ok(swipe) if swipe.direction == Direction::Right => {
                            tx.send_modify(|count| *count += 1);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!(error = %e, "ignoring undecodable swipe event");
                        }
                    }
                }
            })),
            Err(e) => {
                warn!(error = %e, "like subscription unavailable, count will not update");
                None
            }
        };

        Self { rx, task }
    }

    pub fn count(&self) -> u64 {
        *self.rx.borrow()
    }

    /// A receiver that observes every count change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.rx.clone()
    }

    /// Abort the fold task and release the subscription. The count never
    /// moves again.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for LikeCounter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Incoming right swipes toward the viewer, minus those whose swiper the
/// viewer has already swiped on. A failed query leaves the count at zero.
async fn initial_count<D: DataAccess>(data: &D, viewer_id: Uuid) -> u64 {
    let incoming = Predicate::new()
        .eq("swiped_id", viewer_id)
        .eq("direction", Direction::Right);
    let received = match data.query(tables::SWIPES, &incoming).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "incoming swipe query failed, starting at zero");
            return 0;
        }
    };

    let outgoing = Predicate::new().eq("swiper_id", viewer_id);
    let sent = match data.query(tables::SWIPES, &outgoing).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "outgoing swipe query failed, starting at zero");
            return 0;
        }
    };

    let already_swiped: HashSet<Uuid> = decode_rows::<NewSwipeDecision>(sent)
        .into_iter()
        .map(|swipe| swipe.swiped_id)
        .collect();

    decode_rows::<NewSwipeDecision>(received)
        .into_iter()
        .filter(|swipe| !already_swiped.contains(&swipe.swiper_id))
        .count() as u64
}
