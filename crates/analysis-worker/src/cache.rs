//! Position evaluation cache shared by every analysis task.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chess_review::eval::PositionEval;
use chess_review::opening_book::normalize_fen;
use lru::LruCache;

/// LRU keyed by (normalized FEN, search depth). Move counters are dropped
/// from the FEN so transpositions share an entry.
pub struct EvalCache {
    entries: Mutex<LruCache<(String, u32), PositionEval>>,
}

impl EvalCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, fen: &str, depth: u32) -> Option<PositionEval> {
        let key = (normalize_fen(fen), depth);
        if let Ok(mut entries) = self.entries.lock() {
            return entries.get(&key).cloned();
        }
        None
    }

    pub fn insert(&self, fen: &str, depth: u32, eval: PositionEval) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put((normalize_fen(fen), depth), eval);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_review::eval::EngineScore;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_keyed_by_position_and_depth() {
        let cache = EvalCache::new(8);
        cache.insert(START, 18, PositionEval::score_only(EngineScore::Centipawns(20)));

        let transposed = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3";
        assert_eq!(
            cache.get(transposed, 18).and_then(|e| e.score),
            Some(EngineScore::Centipawns(20))
        );
        assert!(cache.get(START, 12).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = EvalCache::new(2);
        cache.insert("8/8/8/8/8/8/8/K6k w - - 0 1", 10, PositionEval::unavailable());
        cache.insert("8/8/8/8/8/8/8/K5k1 w - - 0 1", 10, PositionEval::unavailable());
        cache.insert("8/8/8/8/8/8/8/K4k2 w - - 0 1", 10, PositionEval::unavailable());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("8/8/8/8/8/8/8/K6k w - - 0 1", 10).is_none());
    }

    #[test]
    fn test_zero_capacity_still_works() {
        let cache = EvalCache::new(0);
        cache.insert(START, 1, PositionEval::unavailable());
        assert_eq!(cache.len(), 1);
    }
}
