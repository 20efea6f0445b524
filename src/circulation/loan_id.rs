//! Loan identifier generation.

use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix of every generated loan id.
pub const LOAN_ID_PREFIX: &str = "L-";

/// Generates `L-<YYYYMMDDHHMMSS>-<8 hex>` identifiers.
///
/// The suffix is taken from a SHA-256 digest over the full-precision time, a
/// per-generator counter and the loan's book and member, so ids produced in
/// the same second still differ.
#[derive(Debug, Default)]
pub struct LoanIdGenerator {
    counter: AtomicU64,
}

impl LoanIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next candidate id.
    pub fn generate(&self, at: NaiveDateTime, book_isbn: &str, member_id: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(at.format("%Y-%m-%dT%H:%M:%S%.f").to_string().as_bytes());
        hasher.update(n.to_le_bytes());
        hasher.update(book_isbn.as_bytes());
        hasher.update([0u8]);
        hasher.update(member_id.as_bytes());
        let digest = hasher.finalize();

        format!(
            "{}{}-{}",
            LOAN_ID_PREFIX,
            at.format("%Y%m%d%H%M%S"),
            hex::encode(&digest[..4])
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_format() {
        let id = LoanIdGenerator::new().generate(at(), "978-1234", "U1");

        assert!(id.starts_with("L-20240301090507-"));
        let suffix = id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_second_ids_differ() {
        let generator = LoanIdGenerator::new();
        let a = generator.generate(at(), "978-1234", "U1");
        let b = generator.generate(at(), "978-1234", "U1");
        assert_ne!(a, b);
    }
}
