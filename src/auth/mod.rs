mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{SESSION_TTL_HOURS, UserClaims, generate_token, process_token, session_claims};
mod reset_token;
pub use reset_token::{RESET_TOKEN_TTL_MINUTES, ResetToken, hash_reset_token};
mod error;
pub use error::{CryptError, CryptResult};
