//! Engine tuning knobs, passed explicitly to [`crate::EngineBuilder::config`].

use chrono::Duration;

/// Password hashing cost and session lifetimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// bcrypt cost used for new password hashes.
    pub bcrypt_cost: u32,
    /// Lifetime of a session from creation or refresh.
    pub session_timeout: Duration,
    /// A valid session closer than this to its expiry is refreshed on use.
    pub refresh_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: 14,
            session_timeout: Duration::hours(1),
            refresh_window: Duration::minutes(15),
        }
    }
}
