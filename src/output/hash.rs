//! Content hashing for artifact names and manifest revisions.
//!
//! Uses blake3: stable across runs and platforms, so unchanged inputs always
//! produce identical names and manifest revisions.

use std::fmt;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte slice.
    #[inline]
    pub fn of(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex (manifest revision).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex chars (file name token), clamped to the full length.
    pub fn short(self, len: usize) -> String {
        let hex = self.to_hex();
        let len = len.clamp(1, hex.len());
        hex[..len].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(ContentHash::of(b"body{}"), ContentHash::of(b"body{}"));
        assert_ne!(ContentHash::of(b"body{}"), ContentHash::of(b"body{ }"));
    }

    #[test]
    fn test_short_clamps() {
        let hash = ContentHash::of(b"x");
        assert_eq!(hash.short(8).len(), 8);
        assert_eq!(hash.short(0).len(), 1);
        assert_eq!(hash.short(500).len(), 64);
        assert!(hash.to_hex().starts_with(&hash.short(8)));
    }

    #[test]
    fn test_display_is_prefix() {
        let hash = ContentHash([0xab; 32]);
        assert_eq!(format!("{}", hash), "abababababababab");
    }
}
