//! Content-addressed hashing of a canonical binnacle sequence (spec.md
//! §4.8). Order-independent over the *input* list: callers must sort by
//! `index` before hashing, which this function does internally so the
//! invariant holds regardless of extraction order.

use sha2::{Digest, Sha256};

use super::canonical::CanonicalBinnacle;

/// Sort by `index` ascending, serialize with keys in the struct's declared
/// (fixed) field order, and SHA-256 the UTF-8 byte stream. Returns a
/// 64-char lowercase hex string.
pub fn hash_binnacles(binnacles: &[CanonicalBinnacle]) -> String {
    let mut sorted: Vec<&CanonicalBinnacle> = binnacles.iter().collect();
    sorted.sort_by_key(|b| b.index);

    let payload = serde_json::to_vec(&sorted).expect("canonical binnacles are always serializable");

    let mut hasher = Sha256::new();
    hasher.update(&payload);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binnacle(index: i32, acto: &str) -> CanonicalBinnacle {
        CanonicalBinnacle {
            index,
            resolution_date: None,
            entry_date: None,
            resolution: None,
            notification_type: None,
            acto: Some(acto.to_string()),
            fojas: None,
            folios: None,
            proveido_date: None,
            sumilla: None,
            user_description: None,
            notification_count: 0,
        }
    }

    #[test]
    fn hash_is_64_char_lowercase_hex() {
        let h = hash_binnacles(&[binnacle(1, "X")]);
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn hash_is_order_independent_on_input() {
        let forward = vec![binnacle(1, "A"), binnacle(2, "B")];
        let reversed = vec![binnacle(2, "B"), binnacle(1, "A")];
        assert_eq!(hash_binnacles(&forward), hash_binnacles(&reversed));
    }

    #[test]
    fn distinct_lists_hash_differently() {
        let a = vec![binnacle(1, "A")];
        let b = vec![binnacle(1, "B")];
        assert_ne!(hash_binnacles(&a), hash_binnacles(&b));
    }

    #[test]
    fn notification_count_participates_in_hash() {
        let mut a = binnacle(1, "A");
        let mut b = a.clone();
        a.notification_count = 0;
        b.notification_count = 1;
        assert_ne!(hash_binnacles(&[a]), hash_binnacles(&[b]));
    }
}
