use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Shown when a profile row carries no photos at all.
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1511367461989-f85a21fda167?q=80&w=1000&auto=format&fit=crop";

/// Photo grid size on the edit screen.
pub const MAX_PHOTO_SLOTS: usize = 6;

// --- Gender / Preference ---

/// Gender values as stored in the `profiles.gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Homem,
    Mulher,
}

/// Who the viewer wants to see, as stored in `profiles.preference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preference {
    Homens,
    Mulheres,
    Todos,
}

impl Preference {
    /// The gender the candidate pool is filtered to. `Todos` leaves the
    /// pool unfiltered.
    pub fn target_gender(&self) -> Option<Gender> {
        match self {
            Self::Homens => Some(Gender::Homem),
            Self::Mulheres => Some(Gender::Mulher),
            Self::Todos => None,
        }
    }
}

// --- Profile ---

/// A full row of the `profiles` table.
///
/// Only `id` is required. Every other column carries a serde default so a
/// partially filled row decodes instead of failing; accessors substitute
/// placeholders for missing display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub preference: Option<Preference>,
    #[serde(default)]
    pub sign: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub communication: Option<String>,
    #[serde(default)]
    pub love_language: Option<String>,
    #[serde(default)]
    pub musical_style: Option<String>,
    #[serde(default)]
    pub pets: Option<String>,
    #[serde(default)]
    pub drink: Option<String>,
    #[serde(default)]
    pub smoke: Option<String>,
    #[serde(default)]
    pub exercise: Option<String>,
    #[serde(default)]
    pub social: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub intention: Option<String>,
    #[serde(default)]
    pub hide_age: bool,
    #[serde(default)]
    pub hide_city: bool,
    #[serde(default)]
    pub distance: Option<i32>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Sem nome")
    }

    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .filter(|u| !u.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}

// --- ProfileDraft ---

/// Editable form state for the viewer's own profile.
///
/// Validated before every save; the photo list is capped at
/// [`MAX_PHOTO_SLOTS`] entries.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileDraft {
    #[validate(length(min = 2, max = 60, message = "display name must be 2-60 characters"))]
    pub full_name: String,
    #[validate(range(min = 18, max = 120, message = "age must be at least 18"))]
    pub age: i32,
    pub city: Option<String>,
    #[validate(length(max = 500, message = "bio is capped at 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 6, message = "at most 6 photos"))]
    pub images: Vec<String>,
    pub gender: Option<Gender>,
    pub orientation: Option<String>,
    pub preference: Option<Preference>,
    pub sign: Option<String>,
    pub education: Option<String>,
    pub family: Option<String>,
    pub communication: Option<String>,
    pub love_language: Option<String>,
    pub musical_style: Option<String>,
    pub pets: Option<String>,
    pub drink: Option<String>,
    pub smoke: Option<String>,
    pub exercise: Option<String>,
    pub social: Option<String>,
    pub interests: Option<String>,
    pub intention: Option<String>,
    pub hide_age: bool,
    pub hide_city: bool,
    pub distance: Option<i32>,
}

impl ProfileDraft {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            age: profile.age.unwrap_or(18),
            city: profile.city.clone(),
            bio: profile.bio.clone(),
            images: profile.images.clone(),
            gender: profile.gender,
            orientation: profile.orientation.clone(),
            preference: profile.preference,
            sign: profile.sign.clone(),
            education: profile.education.clone(),
            family: profile.family.clone(),
            communication: profile.communication.clone(),
            love_language: profile.love_language.clone(),
            musical_style: profile.musical_style.clone(),
            pets: profile.pets.clone(),
            drink: profile.drink.clone(),
            smoke: profile.smoke.clone(),
            exercise: profile.exercise.clone(),
            social: profile.social.clone(),
            interests: profile.interests.clone(),
            intention: profile.intention.clone(),
            hide_age: profile.hide_age,
            hide_city: profile.hide_city,
            distance: profile.distance,
        }
    }

    /// Serialize into the upsert payload for the viewer's row, stamping a
    /// fresh `updated_at`.
    pub fn to_row(&self, id: Uuid) -> crate::errors::AppResult<serde_json::Value> {
        let mut row = serde_json::to_value(self)?;
        if let Some(map) = row.as_object_mut() {
            map.insert("id".into(), serde_json::to_value(id)?);
            map.insert("updated_at".into(), serde_json::to_value(Utc::now())?);
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[test]
    fn partial_row_decodes_with_defaults() {
        let row = json!({ "id": "0b1f8f6e-9a55-4a5e-9c2e-0c1b6f5a7d10" });
        let profile: Profile = serde_json::from_value(row).unwrap();
        assert_eq!(profile.display_name(), "Sem nome");
        assert_eq!(profile.primary_image(), PLACEHOLDER_IMAGE);
        assert!(profile.images.is_empty());
        assert!(!profile.hide_age);
    }

    #[test]
    fn row_without_id_fails_to_decode() {
        let row = json!({ "full_name": "Ana" });
        assert!(serde_json::from_value::<Profile>(row).is_err());
    }

    #[test]
    fn gender_and_preference_wire_values() {
        assert_eq!(serde_json::to_string(&Gender::Homem).unwrap(), "\"Homem\"");
        assert_eq!(
            serde_json::to_string(&Preference::Mulheres).unwrap(),
            "\"Mulheres\""
        );
        let p: Preference = serde_json::from_str("\"Todos\"").unwrap();
        assert_eq!(p.target_gender(), None);
        assert_eq!(Preference::Homens.target_gender(), Some(Gender::Homem));
        assert_eq!(Preference::Mulheres.target_gender(), Some(Gender::Mulher));
    }

    #[test]
    fn draft_validation_rejects_minors_and_photo_overflow() {
        let profile: Profile =
            serde_json::from_value(json!({ "id": "0b1f8f6e-9a55-4a5e-9c2e-0c1b6f5a7d10" }))
                .unwrap();
        let mut draft = ProfileDraft::from_profile(&profile);
        draft.full_name = "Ana".into();
        draft.age = 25;
        assert!(draft.validate().is_ok());

        draft.age = 17;
        assert!(draft.validate().is_err());

        draft.age = 25;
        draft.images = (0..7).map(|i| format!("https://cdn.example/{i}.jpg")).collect();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn to_row_stamps_id_and_updated_at() {
        let id = Uuid::new_v4();
        let profile: Profile = serde_json::from_value(json!({ "id": id })).unwrap();
        let mut draft = ProfileDraft::from_profile(&profile);
        draft.full_name = "Ana".into();

        let row = draft.to_row(id).unwrap();
        assert_eq!(row["id"], json!(id));
        assert!(row.get("updated_at").is_some());
        assert_eq!(row["full_name"], json!("Ana"));
    }
}
