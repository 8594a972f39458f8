use cocotas_shared::data::{decode_rows, tables};
use cocotas_shared::{DataAccess, Predicate, Preference, Profile};
use tracing::warn;

use crate::context::SessionContext;

/// Filters the viewer applies to the candidate pool.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilters {
    pub city: Option<String>,
    pub preference: Option<Preference>,
}

/// Loads the pool of candidate profiles for the session viewer.
pub struct ProfileCatalog<D> {
    ctx: SessionContext<D>,
}

impl<D: DataAccess> ProfileCatalog<D> {
    pub fn new(ctx: SessionContext<D>) -> Self {
        Self { ctx }
    }

    /// Fetch candidates: everyone but the viewer, optionally narrowed to a
    /// city and to the gender the viewer's preference maps to.
    ///
    /// Rows that fail to decode are skipped with a warning. A failed query
    /// degrades to an empty pool the caller may retry.
    pub async fn load(&self, filters: &CatalogFilters) -> Vec<Profile> {
        let mut predicate = Predicate::new().neq("id", self.ctx.viewer_id);
        if let Some(city) = &filters.city {
            predicate = predicate.eq("city", city);
        }
        if let Some(gender) = filters.preference.and_then(|p| p.target_gender()) {
            predicate = predicate.eq("gender", gender);
        }

        match self.ctx.data.query(tables::PROFILES, &predicate).await {
            Ok(rows) => decode_rows(rows),
            Err(e) => {
                warn!(error = %e, "profile query failed, serving an empty pool");
                Vec::new()
            }
        }
    }
}
