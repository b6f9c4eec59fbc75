//! Rate-limited user notices for failed commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// A message for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Deduplication key.
    pub key: String,
    /// Human-readable text.
    pub message: String,
    /// Session time the notice was raised.
    pub at_ms: u64,
}

/// Suppresses repeats of the same notice within a cooldown window.
#[derive(Debug, Clone, Default)]
pub struct NoticeThrottle {
    cooldown_ms: u64,
    last_shown: BTreeMap<String, u64>,
}

impl NoticeThrottle {
    /// Throttle with the given window.
    #[must_use]
    pub const fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_shown: BTreeMap::new(),
        }
    }

    /// True when `key` may be shown at `now_ms`; records the showing.
    ///
    /// Entries whose window has passed are forgotten.
    pub fn admit(&mut self, key: &str, now_ms: u64) -> bool {
        let cooldown = self.cooldown_ms;
        self.last_shown.retain(|_, last| now_ms.saturating_sub(*last) < cooldown);
        if self.last_shown.contains_key(key) {
            return false;
        }
        self.last_shown.insert(key.to_owned(), now_ms);
        true
    }

    /// Keys still inside their window.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.last_shown.len()
    }

    /// Notice for a command error, unless an identical one is cooling down.
    pub fn notice(&mut self, error: &GameError, now_ms: u64) -> Option<Notice> {
        let key = error.notice_key();
        if !self.admit(&key, now_ms) {
            tracing::trace!(%key, "Notice suppressed");
            return None;
        }
        Some(Notice {
            message: error.to_string(),
            key,
            at_ms: now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::{Cost, Resources};
    use crate::grid::GridPos;

    #[test]
    fn test_identical_notices_are_throttled() {
        let mut throttle = NoticeThrottle::new(2000);
        let err = GameError::NoTurret(GridPos::new(1, 1));
        assert!(throttle.notice(&err, 0).is_some());
        assert!(throttle.notice(&err, 1999).is_none());
        assert!(throttle.notice(&err, 2000).is_some());
    }

    #[test]
    fn test_distinct_notices_pass() {
        let mut throttle = NoticeThrottle::new(2000);
        assert!(throttle.notice(&GameError::NoTurret(GridPos::new(1, 1)), 0).is_some());
        assert!(throttle.notice(&GameError::NoBuilding(GridPos::new(1, 1)), 0).is_some());
        assert!(throttle.notice(&GameError::MatchOver, 0).is_some());
    }

    #[test]
    fn test_shortfall_throttled_while_balance_changes() {
        let mut throttle = NoticeThrottle::new(2000);
        let short = |metal| GameError::InsufficientResources {
            required: Cost::metal(50),
            available: Resources::new(0, metal),
        };
        assert!(throttle.notice(&short(10), 0).is_some());
        assert!(throttle.notice(&short(25), 500).is_none());
        assert!(throttle.notice(&GameError::NoTurret(GridPos::new(3, 3)), 600).is_some());
        assert!(throttle.notice(&GameError::NoTurret(GridPos::new(5, 1)), 700).is_none());
    }

    #[test]
    fn test_expired_keys_are_forgotten() {
        let mut throttle = NoticeThrottle::new(2000);
        throttle.notice(&GameError::MatchOver, 0);
        throttle.notice(&GameError::NotPlaying, 100);
        assert_eq!(throttle.tracked(), 2);

        assert!(throttle.notice(&GameError::NoSpawn, 2050).is_some());
        assert_eq!(throttle.tracked(), 2);
        assert!(throttle.notice(&GameError::NoBase, 5000).is_some());
        assert_eq!(throttle.tracked(), 1);
    }
}
