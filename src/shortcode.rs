//! Short code issuance
//!
//! Codes are drawn from a URL-safe alphabet and checked against storage
//! before use. The storage `UNIQUE` constraint remains the final guard
//! against two requests racing on the same candidate.

use rand::RngExt;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::Storage;

/// URL-safe alphabet, 64 symbols
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Upper bound on lookups per issued code. With 64^8 possible codes this is
/// never reached unless storage or the code source misbehaves.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Source of candidate codes.
pub trait CodeSource: Send + Sync {
    fn next_code(&self, length: usize) -> String;
}

/// Candidates from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn next_code(&self, length: usize) -> String {
        let mut rng = rand::rng();
        (0..length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("no unique short code found after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error("short code lookup failed: {0}")]
    Storage(#[from] anyhow::Error),
}

pub struct ShortCodeIssuer {
    storage: Arc<dyn Storage>,
    source: Arc<dyn CodeSource>,
    length: usize,
    max_attempts: usize,
}

impl ShortCodeIssuer {
    pub fn new(storage: Arc<dyn Storage>, length: usize) -> Self {
        Self::with_source(storage, Arc::new(RandomCodeSource), length)
    }

    pub fn with_source(storage: Arc<dyn Storage>, source: Arc<dyn CodeSource>, length: usize) -> Self {
        Self {
            storage,
            source,
            length,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Return a code no stored link currently uses.
    pub async fn issue(&self) -> Result<String, IssueError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.next_code(self.length);

            if self
                .storage
                .find_link_by_short_code(&candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }

            tracing::debug!(attempt, short_code = %candidate, "short code collision, retrying");
        }

        Err(IssueError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
