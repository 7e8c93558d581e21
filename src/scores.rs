use crate::identity::LocalStore;

/// Storage keys for the single-player best-score caches. Keys match the
/// browser profile records so existing saves carry over.
pub const BEST_2048_KEY: &str = "2048BestScore";
pub const SNAKE_HIGH_SCORE_KEY: &str = "snakeHighScore";
pub const MEMORY_MATCH_BEST_KEY: &str = "memoryMatchBest";
pub const TYPING_BEST_WPM_KEY: &str = "typingBestWpm";

/// Best-score cache over the local store: read on load, write-through on
/// improvement, no expiry. 2048/snake/typing track a maximum; memory match
/// tracks a minimum (fewest moves).
pub struct ScoreCache<S> {
    store: S,
}

impl<S: LocalStore> ScoreCache<S> {
    pub fn new(store: S) -> Self {
        ScoreCache { store }
    }

    /// The cached best for a key, or `None` if nothing was ever recorded.
    pub fn best(&self, key: &str) -> Option<u32> {
        self.store.get(key).and_then(|raw| raw.parse().ok())
    }

    /// Record a higher-is-better score. Returns true when the cache was
    /// updated.
    pub fn record_high(&self, key: &str, score: u32) -> bool {
        let improved = match self.best(key) {
            Some(best) => score > best,
            None => true,
        };
        if improved {
            self.store.set(key, &score.to_string());
        }
        improved
    }

    /// Record a lower-is-better score (fewest moves). Returns true when the
    /// cache was updated.
    pub fn record_low(&self, key: &str, score: u32) -> bool {
        let improved = match self.best(key) {
            Some(best) => score < best,
            None => true,
        };
        if improved {
            self.store.set(key, &score.to_string());
        }
        improved
    }
}
