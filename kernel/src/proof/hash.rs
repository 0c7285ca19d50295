//! Canonical hashing types and domain separation constants.
//!
//! Every content-addressed artifact in this workspace (state fingerprints,
//! plan fingerprints, problem digests) goes through [`canonical_hash`] with
//! a domain prefix from this module. Exactly one place defines canonical
//! hashing; new artifact kinds add a new `DOMAIN_*` constant here rather than
//! hashing ad hoc elsewhere.

use sha2::{Digest, Sha256};

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`)
///
/// Invariant: the inner string always contains exactly one `:` separator,
/// with non-empty substrings on both sides (enforced by [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    /// Full string in `"algorithm:hex_digest"` format.
    full: String,
    /// Byte offset of the `:` separator (cached from parse).
    colon: usize,
}

impl ContentHash {
    /// Parse from `"algorithm:hex_digest"` format.
    ///
    /// Validation rules (enforced to prevent "almost-valid" artifacts):
    /// - Exactly one `:` separator.
    /// - Algorithm: non-empty, ASCII lowercase alphanumeric only (e.g., `sha256`, `blake3`).
    /// - Digest: non-empty, lowercase hex only (`[0-9a-f]+`).
    ///
    /// Returns `None` if the format is invalid.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let colon = s.find(':')?;

        // Exactly one colon.
        if s[colon + 1..].contains(':') {
            return None;
        }

        let algorithm = &s[..colon];
        let digest = &s[colon + 1..];

        if algorithm.is_empty()
            || !algorithm
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return None;
        }

        if digest.is_empty()
            || !digest
                .bytes()
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return None;
        }

        Some(Self {
            full: s.to_string(),
            colon,
        })
    }

    /// The algorithm portion (e.g., "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full string representation (`"algorithm:hex_digest"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

// Domain separation constants. Each prefix is null-terminated so that a
// fingerprint of domain A over data D never collides with a fingerprint of
// domain B over the same bytes D.

/// Domain prefix for fluent-set state fingerprints.
pub const DOMAIN_STATE: &[u8] = b"WIDTHPLAN::STATE::V1\0";

/// Domain prefix for search-node fingerprints (state + depth + producing action).
pub const DOMAIN_SEARCH_NODE: &[u8] = b"WIDTHPLAN::SEARCH_NODE::V1\0";

/// Domain prefix for grounded-action fingerprints.
pub const DOMAIN_ACTION: &[u8] = b"WIDTHPLAN::ACTION::V1\0";

/// Domain prefix for extracted-plan fingerprints.
pub const DOMAIN_PLAN: &[u8] = b"WIDTHPLAN::PLAN::V1\0";

/// Domain prefix for grounded-problem digests (used to key novelty tables
/// across problem instances in long-running services).
pub const DOMAIN_PROBLEM: &[u8] = b"WIDTHPLAN::PROBLEM::V1\0";

/// Compute the canonical hash of a byte slice with domain separation.
///
/// Computes `sha256(domain_prefix || data)` and returns `"sha256:<hex_digest>"`.
/// The domain prefix must include the null terminator (all `DOMAIN_*`
/// constants in this module already do).
#[must_use]
pub fn canonical_hash(domain: &[u8], data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    let full = format!("sha256:{hex}");
    let colon = 6; // "sha256" is 6 bytes
    ContentHash { full, colon }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_parse_valid() {
        let h = ContentHash::parse("sha256:abcdef0123456789").unwrap();
        assert_eq!(h.algorithm(), "sha256");
        assert_eq!(h.hex_digest(), "abcdef0123456789");
        assert_eq!(h.as_str(), "sha256:abcdef0123456789");
    }

    #[test]
    fn content_hash_parse_rejects_bad_format() {
        assert!(ContentHash::parse("nocolon").is_none());
        assert!(ContentHash::parse(":noalg").is_none());
        assert!(ContentHash::parse("nodigest:").is_none());
        assert!(ContentHash::parse("sha256:abc:def").is_none());
        assert!(ContentHash::parse("SHA256:abcdef").is_none());
        assert!(ContentHash::parse("sha256:ABCDEF").is_none());
        assert!(ContentHash::parse("sha256:xyz123").is_none());
        assert!(ContentHash::parse("sha-256:abcdef").is_none());
    }

    #[test]
    fn domain_prefixes_are_null_terminated() {
        assert!(DOMAIN_STATE.ends_with(&[0]));
        assert!(DOMAIN_SEARCH_NODE.ends_with(&[0]));
        assert!(DOMAIN_ACTION.ends_with(&[0]));
        assert!(DOMAIN_PLAN.ends_with(&[0]));
        assert!(DOMAIN_PROBLEM.ends_with(&[0]));
    }

    #[test]
    fn domain_prefixes_are_pairwise_distinct() {
        let domains = [
            DOMAIN_STATE,
            DOMAIN_SEARCH_NODE,
            DOMAIN_ACTION,
            DOMAIN_PLAN,
            DOMAIN_PROBLEM,
        ];
        for (i, a) in domains.iter().enumerate() {
            for (j, b) in domains.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn canonical_hash_returns_valid_content_hash() {
        let h = canonical_hash(DOMAIN_STATE, b"test");
        assert!(ContentHash::parse(h.as_str()).is_some());
        assert_eq!(h.algorithm(), "sha256");
        assert_eq!(h.hex_digest().len(), 64);
    }

    #[test]
    fn canonical_hash_deterministic() {
        let first = canonical_hash(DOMAIN_STATE, b"determinism");
        for _ in 0..10 {
            assert_eq!(canonical_hash(DOMAIN_STATE, b"determinism"), first);
        }
    }

    #[test]
    fn canonical_hash_is_domain_separated() {
        let a = canonical_hash(DOMAIN_STATE, b"same-bytes");
        let b = canonical_hash(DOMAIN_ACTION, b"same-bytes");
        assert_ne!(a, b);
    }
}
