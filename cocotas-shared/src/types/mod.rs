mod event;
mod profile;
mod swipe;

pub use event::InsertEvent;
pub use profile::{Gender, Preference, Profile, ProfileDraft, MAX_PHOTO_SLOTS, PLACEHOLDER_IMAGE};
pub use swipe::{canonical_pair, Direction, MatchRow, NewSwipeDecision, SwipeDecision};
