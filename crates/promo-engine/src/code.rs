//! Promotional code generation.

use promo_core::{CODE_SUFFIX_BYTES, DEFAULT_CODE_PREFIX};
use promo_store::PromoCode;
use rand::RngCore;
use rand::rngs::OsRng;

/// Produces codes of the form `PREFIX-XXXXXX`.
///
/// The suffix is `CODE_SUFFIX_BYTES` bytes from the OS random source, hex
/// encoded in upper case. The generator never checks uniqueness: a code is
/// bound to one record by the store's write-once field, so uniqueness is
/// per record, not global.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    prefix: String,
}

impl CodeGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The fixed prefix.
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Draw a fresh code.
    pub fn generate(&self) -> PromoCode {
        let mut suffix = [0u8; CODE_SUFFIX_BYTES];
        OsRng.fill_bytes(&mut suffix);
        PromoCode::new(format!("{}-{}", self.prefix, hex::encode_upper(suffix)))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_code_shape() {
        let code = CodeGenerator::new("MEBEL").generate();
        let (prefix, suffix) = code.as_str().split_once('-').unwrap();
        assert_eq!(prefix, "MEBEL");
        assert_eq!(suffix.len(), CODE_SUFFIX_BYTES * 2);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn test_codes_vary() {
        let generator = CodeGenerator::default();
        let codes: HashSet<_> = (0..64).map(|_| generator.generate()).collect();
        // 64 draws from 16^6 values; a handful of collisions would still pass.
        assert!(codes.len() > 60);
    }
}
