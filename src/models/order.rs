use chrono::{DateTime, Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::CartItem;

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// An immutable order snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub items: Vec<CartItem>,
    pub note: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(items: Vec<CartItem>, note: String, user_name: String) -> Self {
        let created_at = Utc::now();
        Self {
            id: generate_order_id(created_at),
            items,
            note,
            user_name,
            created_at,
        }
    }

    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// `YYYYMMDDHHMMSS-XXXX` in local time with a random base-36 suffix, so ids
/// sort by creation time.
pub fn generate_order_id(at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| ID_SUFFIX_ALPHABET[rng.random_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}-{}",
        at.with_timezone(&Local).format("%Y%m%d%H%M%S"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    #[test]
    fn test_order_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 5).unwrap();
        let id = generate_order_id(at);
        let pattern = Regex::new(r"^\d{14}-[0-9A-Z]{4}$").unwrap();
        assert!(pattern.is_match(&id), "unexpected id {id}");
    }

    #[test]
    fn test_order_ids_sort_by_time() {
        let earlier = generate_order_id(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap());
        let later = generate_order_id(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
