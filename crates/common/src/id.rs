//! ID and token generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use ulid::Ulid;

/// ID generator for entities and opaque tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort by creation time, so ordering rows by ID follows
    /// insertion order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate `count` IDs that sort in the order they were generated,
    /// even when they fall within the same millisecond.
    #[must_use]
    pub fn generate_ordered(&self, count: usize) -> Vec<String> {
        let mut generator = ulid::Generator::new();
        (0..count)
            .map(|_| {
                generator
                    .generate()
                    .unwrap_or_else(|_| Ulid::new())
                    .to_string()
                    .to_lowercase()
            })
            .collect()
    }

    /// Generate a session token: 32 random bytes, base64url without padding.
    #[must_use]
    pub fn generate_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Generate a short CSRF `state` value for the OAuth redirect.
    #[must_use]
    pub fn generate_state(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_ordered_is_sorted() {
        let ids = IdGenerator::new().generate_ordered(100);
        let mut sorted = ids.clone();
        sorted.sort();

        assert_eq!(ids.len(), 100);
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert_ne!(token, id_gen.generate_token());
    }

    #[test]
    fn test_generate_state() {
        let state = IdGenerator::new().generate_state();
        assert_eq!(state.len(), 32);
    }
}
