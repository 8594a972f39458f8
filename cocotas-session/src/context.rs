use std::sync::Arc;

use cocotas_shared::DataAccess;
use uuid::Uuid;

use crate::events::EventBus;

/// Everything a session component needs from its surroundings: who is
/// looking, how to reach the backend, and where to publish events.
///
/// Passed explicitly into every component constructor; there is no ambient
/// session state.
#[derive(Debug)]
pub struct SessionContext<D> {
    pub viewer_id: Uuid,
    pub data: Arc<D>,
    pub bus: EventBus,
}

impl<D: DataAccess> SessionContext<D> {
    pub fn new(viewer_id: Uuid, data: Arc<D>) -> Self {
        Self {
            viewer_id,
            data,
            bus: EventBus::new(),
        }
    }
}

impl<D> Clone for SessionContext<D> {
    fn clone(&self) -> Self {
        Self {
            viewer_id: self.viewer_id,
            data: Arc::clone(&self.data),
            bus: self.bus.clone(),
        }
    }
}
