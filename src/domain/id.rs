use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;

/// Width of the `YYYYMMDDHHMMSSffffff` prefix.
pub const TIMESTAMP_PREFIX_LEN: usize = 20;

/// Produces transaction identifiers made of a UTC timestamp prefix followed by a
/// random alphanumeric suffix.
///
/// The prefix orders identifiers by creation time. The suffix, drawn from the
/// operating system CSPRNG, is what keeps identifiers minted within the same
/// microsecond apart.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next_id(&self, target_length: usize) -> String {
        self.next_id_at(Utc::now(), target_length)
    }

    /// Builds an identifier for the given instant.
    ///
    /// When the timestamp prefix alone already reaches `target_length` the suffix
    /// is empty and the identifier is exactly the prefix.
    pub fn next_id_at(&self, now: DateTime<Utc>, target_length: usize) -> String {
        let mut id = now.format("%Y%m%d%H%M%S%6f").to_string();
        let suffix_len = target_length.saturating_sub(id.len());
        id.extend(
            OsRng
                .sample_iter(&Alphanumeric)
                .take(suffix_len)
                .map(char::from),
        );
        id
    }
}
