//! Human-readable application numbers: prefix, UTC date, six random digits.

use jiff::Timestamp;
use rand::Rng;

/// Source of candidate application numbers.
///
/// Uniqueness is enforced by the store; a generator only has to make
/// collisions unlikely.
pub trait ApplicationNumberGenerator: Send + Sync {
    fn generate(&self, at: Timestamp) -> String;
}

/// `{prefix}{YYYYMMDD}{NNNNNN}` with a uniformly random suffix.
#[derive(Debug, Clone)]
pub struct RandomSuffixGenerator {
    prefix: String,
}

impl RandomSuffixGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ApplicationNumberGenerator for RandomSuffixGenerator {
    fn generate(&self, at: Timestamp) -> String {
        let date = at.strftime("%Y%m%d");
        let suffix: u32 = rand::rng().random_range(0..1_000_000);
        format!("{}{}{:06}", self.prefix, date, suffix)
    }
}
