//! Compact alternate keys: share-link short ids and reporter codes.
//!
//! Neither is guaranteed unique on its own. The store carries UNIQUE
//! indexes on both columns and those are the real guarantee.

use chrono::Utc;
use rand::Rng;

use crate::constants::{REPORTER_CODE_PREFIX, SHORT_ID_LEN, SHORT_ID_RANDOM_LEN};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode an integer in lowercase base 36.
pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate a share-link token: base36 milliseconds followed by random
/// base36 characters, cut to [`SHORT_ID_LEN`].
pub fn generate_short_id() -> String {
    let mut rng = rand::thread_rng();
    let millis = Utc::now().timestamp_millis().max(0) as u64;

    let mut id = to_base36(millis);
    id.extend(
        (0..SHORT_ID_RANDOM_LEN).map(|_| BASE36_DIGITS[rng.gen_range(0..36)] as char),
    );
    id.truncate(SHORT_ID_LEN);
    id
}

/// Generate a reporter code such as `RPT4821057`: the last four digits of
/// the unix-seconds clock followed by a three digit random number.
pub fn generate_reporter_code() -> String {
    let secs = Utc::now().timestamp().rem_euclid(10_000);
    let n: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{REPORTER_CODE_PREFIX}{secs:04}{n:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_short_id_shape() {
        for _ in 0..50 {
            let id = generate_short_id();
            assert_eq!(id.len(), SHORT_ID_LEN);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_reporter_code_shape() {
        let code = generate_reporter_code();
        assert!(code.starts_with(REPORTER_CODE_PREFIX));
        let digits = &code[REPORTER_CODE_PREFIX.len()..];
        assert_eq!(digits.len(), 7);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
