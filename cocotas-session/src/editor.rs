use cocotas_shared::data::tables;
use cocotas_shared::errors::{AppError, AppResult, ErrorCode};
use cocotas_shared::{DataAccess, Predicate, Profile, ProfileDraft, MAX_PHOTO_SLOTS};
use tracing::warn;
use validator::Validate;

use crate::context::SessionContext;

/// Edit-and-save workflow for the viewer's own profile row.
///
/// `load` pulls the row through a single-row query (partial rows decode with
/// defaults), edits accumulate on a [`ProfileDraft`], and `save` validates
/// the draft and upserts it keyed on `id`.
#[derive(Debug)]
pub struct ProfileEditor<D> {
    ctx: SessionContext<D>,
    draft: ProfileDraft,
}

impl<D: DataAccess> ProfileEditor<D> {
    pub async fn load(ctx: SessionContext<D>) -> AppResult<Self> {
        let predicate = Predicate::new().eq("id", ctx.viewer_id);
        let row = ctx.data.query_one(tables::PROFILES, &predicate).await?;
        let profile: Profile = serde_json::from_value(row)?;
        Ok(Self {
            draft: ProfileDraft::from_profile(&profile),
            ctx,
        })
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProfileDraft {
        &mut self.draft
    }

    /// Add a photo to the first empty slot. Returns `false` when all
    /// [`MAX_PHOTO_SLOTS`] slots are taken.
    pub fn add_photo(&mut self, url: impl Into<String>) -> bool {
        if self.draft.images.len() >= MAX_PHOTO_SLOTS {
            return false;
        }
        self.draft.images.push(url.into());
        true
    }

    /// Remove the photo at `slot`; later photos shift down to keep the grid
    /// compact. Out-of-range slots are ignored.
    pub fn remove_photo(&mut self, slot: usize) {
        if slot < self.draft.images.len() {
            self.draft.images.remove(slot);
        }
    }

    /// Validate and upsert the draft. Failure is logged and surfaced as a
    /// recoverable error; nothing is retried.
    pub async fn save(&self) -> AppResult<()> {
        if let Err(validation) = self.draft.validate() {
            let details = serde_json::to_value(&validation).unwrap_or_default();
            return Err(AppError::with_details(
                ErrorCode::ValidationError,
                "profile draft failed validation",
                details,
            ));
        }

        let row = self.draft.to_row(self.ctx.viewer_id)?;
        if let Err(e) = self.ctx.data.upsert(tables::PROFILES, row, "id").await {
            warn!(error = %e, "profile save failed");
            return Err(e);
        }
        Ok(())
    }
}
