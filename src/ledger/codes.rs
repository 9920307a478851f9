//! Redemption code generation.

use rand::Rng;

use super::errors::{LedgerError, LedgerResult};
use crate::db::repository::GiftCardRepository;

/// Length of every redemption code
pub const CODE_LENGTH: usize = 10;

/// Collision retries before giving up
pub const MAX_ATTEMPTS: u32 = 10;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Gift card code generator
pub struct CodeGenerator;

impl CodeGenerator {
    /// Produce one random candidate code
    pub fn random_code() -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }

    /// Generate a code not currently in use
    ///
    /// Regenerates on collision, up to [`MAX_ATTEMPTS`] times. The
    /// check-then-use here is not atomic; the store's unique constraint on
    /// `code` still guards the final insert, and callers must treat a
    /// `DuplicateCode` on insert as the same race.
    ///
    /// # Errors
    ///
    /// * `LedgerError::CodeGenerationExhausted` - All attempts collided
    pub async fn generate_unique(cards: &dyn GiftCardRepository) -> LedgerResult<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            let code = Self::random_code();
            if !cards.code_exists(&code).await? {
                return Ok(code);
            }
            log::debug!("Code collision on attempt {attempt}, regenerating");
        }
        Err(LedgerError::CodeGenerationExhausted(MAX_ATTEMPTS))
    }
}
