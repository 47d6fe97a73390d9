//! One-time password reset tokens. Only the SHA-256 digest is stored; the raw
//! token travels in the emailed link.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone)]
pub struct ResetToken {
    pub raw: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut buf = [0u8; 32];
        rand::rng().fill_bytes(&mut buf);
        let raw = hex::encode(buf);
        let hash = hash_reset_token(&raw);

        Self {
            raw,
            hash,
            expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        }
    }
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_token_hash_matches() {
        let token = ResetToken::generate();
        assert_eq!(token.raw.len(), 64);
        assert_eq!(hash_reset_token(&token.raw), token.hash);
        assert_ne!(token.raw, token.hash);
        assert!(token.expires_at > Utc::now());
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(ResetToken::generate().raw, ResetToken::generate().raw);
    }
}
