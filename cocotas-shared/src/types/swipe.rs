use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Direction ---

/// Swipe direction, lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

// --- SwipeDecision ---

/// A full row of the append-only `swipes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeDecision {
    pub id: Uuid,
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `swipes`; the backend fills `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSwipeDecision {
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub direction: Direction,
}

// --- MatchRow ---

/// A row of the `matches` table. The backend writes one row per mutual
/// right swipe, with `user_1`/`user_2` in canonical order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: Uuid,
    pub user_1: Uuid,
    pub user_2: Uuid,
}

/// Order a pair of profile ids the way the `matches` table stores them:
/// by lexicographic comparison of the hyphenated string form.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a.to_string() <= b.to_string() {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direction_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&Direction::Right).unwrap(), "\"right\"");
        let d: Direction = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(d, Direction::Left);
    }

    #[test]
    fn canonical_pair_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
    }

    #[test]
    fn canonical_pair_orders_by_string_form() {
        let lo: Uuid = "1aaaaaaa-0000-0000-0000-000000000000".parse().unwrap();
        let hi: Uuid = "f0000000-0000-0000-0000-000000000000".parse().unwrap();
        assert_eq!(canonical_pair(hi, lo), (lo, hi));
        assert_eq!(canonical_pair(lo, hi), (lo, hi));
        assert!(lo.to_string() < hi.to_string());
    }

    #[test]
    fn canonical_pair_of_equal_ids() {
        let a = Uuid::new_v4();
        assert_eq!(canonical_pair(a, a), (a, a));
    }

    #[test]
    fn new_swipe_serializes_without_row_metadata() {
        let decision = NewSwipeDecision {
            swiper_id: Uuid::new_v4(),
            swiped_id: Uuid::new_v4(),
            direction: Direction::Right,
        };
        let row = serde_json::to_value(&decision).unwrap();
        assert_eq!(row["direction"], json!("right"));
        assert!(row.get("id").is_none());
        assert!(row.get("created_at").is_none());
    }
}
