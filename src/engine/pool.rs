use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PoolError;

/// Factors a pool may hold. The upper end is the largest table a player can
/// configure, so every product fits comfortably in a `u32`.
pub const FACTOR_RANGE: RangeInclusive<u32> = 2..=20;

/// Ordered multiplication operands. `(3, 7)` and `(7, 3)` are distinct facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct FactPair {
    pub a: u32,
    pub b: u32,
}

impl FactPair {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn solution(&self) -> u32 {
        self.a * self.b
    }

    pub fn in_range(&self) -> bool {
        FACTOR_RANGE.contains(&self.a) && FACTOR_RANGE.contains(&self.b)
    }
}

impl From<[u32; 2]> for FactPair {
    fn from([a, b]: [u32; 2]) -> Self {
        Self { a, b }
    }
}

impl From<FactPair> for [u32; 2] {
    fn from(pair: FactPair) -> Self {
        [pair.a, pair.b]
    }
}

impl fmt::Display for FactPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \u{00d7} {}", self.a, self.b)
    }
}

/// Weighted multiset of fact pairs.
///
/// Weight is encoded as repetition: a pair occurring five times is five times
/// as likely to be drawn as a pair occurring once. Drawing is a uniform index
/// pick (O(1)); reinforcement scans for the pair and shifts the vector (O(n)),
/// which stays cheap for tables up to 20 × 20.
///
/// The pool is never empty and a pair is never removed when it is its own
/// last occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FactPair>", into = "Vec<FactPair>")]
pub struct CombinationPool {
    pairs: Vec<FactPair>,
}

impl CombinationPool {
    /// Every pair `(i, j)` and `(j, i)` for `i` in `2..max_factor` and `j` in
    /// `2..=max_factor`, each pushed `repetitions` times.
    pub fn generate(max_factor: u32, repetitions: u32) -> Result<Self, PoolError> {
        let mut pairs = Vec::new();
        for i in 2..max_factor {
            for j in 2..=max_factor {
                for _ in 0..repetitions {
                    pairs.push(FactPair::new(i, j));
                    pairs.push(FactPair::new(j, i));
                }
            }
        }
        Self::from_pairs(pairs)
    }

    pub fn from_pairs(pairs: Vec<FactPair>) -> Result<Self, PoolError> {
        if pairs.is_empty() {
            return Err(PoolError::Empty);
        }
        if let Some(bad) = pairs.iter().find(|p| !p.in_range()) {
            return Err(PoolError::FactorOutOfRange { a: bad.a, b: bad.b });
        }
        Ok(Self { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[FactPair] {
        &self.pairs
    }

    pub fn count(&self, pair: FactPair) -> usize {
        self.pairs.iter().filter(|&&p| p == pair).count()
    }

    /// Occurrence count per distinct pair.
    pub fn weights(&self) -> BTreeMap<FactPair, usize> {
        let mut weights = BTreeMap::new();
        for &pair in &self.pairs {
            *weights.entry(pair).or_insert(0) += 1;
        }
        weights
    }

    /// Pick a uniformly random index; a pair's chance is proportional to its
    /// occurrence count.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> FactPair {
        self.pairs[rng.gen_range(0..self.pairs.len())]
    }

    /// Drop the first occurrence of `pair`, but only if another occurrence
    /// remains. Returns whether an occurrence was removed.
    pub fn reinforce_correct(&mut self, pair: FactPair) -> bool {
        let Some(first) = self.pairs.iter().position(|&p| p == pair) else {
            return false;
        };
        let has_second = self.pairs[first + 1..].contains(&pair);
        if has_second {
            self.pairs.remove(first);
        }
        debug!(%pair, removed = has_second, remaining = self.count(pair), "reinforce correct");
        has_second
    }

    /// Insert one more occurrence of `pair` at a uniformly random position.
    pub fn reinforce_wrong<R: Rng + ?Sized>(&mut self, pair: FactPair, rng: &mut R) {
        let ix = rng.gen_range(0..=self.pairs.len());
        self.pairs.insert(ix, pair);
        debug!(%pair, at = ix, occurrences = self.count(pair), "reinforce wrong");
    }
}

impl TryFrom<Vec<FactPair>> for CombinationPool {
    type Error = PoolError;

    fn try_from(pairs: Vec<FactPair>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

impl From<CombinationPool> for Vec<FactPair> {
    fn from(pool: CombinationPool) -> Self {
        pool.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn pair(a: u32, b: u32) -> FactPair {
        FactPair::new(a, b)
    }

    #[test]
    fn test_generate_default_table() {
        let pool = CombinationPool::generate(12, 3).unwrap();
        // i in 2..12 (10 values), j in 2..=12 (11 values), both orders, 3 reps
        assert_eq!(pool.len(), 10 * 11 * 2 * 3);
        // Square facts are pushed twice per repetition
        assert_eq!(pool.count(pair(5, 5)), 6);
        assert_eq!(pool.count(pair(3, 7)), 6);
        // 12 only ever appears paired with i < 12
        assert_eq!(pool.count(pair(12, 2)), 3);
        assert_eq!(pool.count(pair(12, 12)), 0);
    }

    #[test]
    fn test_generate_too_small_table_is_empty() {
        assert_eq!(CombinationPool::generate(2, 3), Err(PoolError::Empty));
        assert_eq!(CombinationPool::generate(12, 0), Err(PoolError::Empty));
    }

    #[test]
    fn test_reinforce_wrong_adds_exactly_one() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut pool = CombinationPool::generate(6, 1).unwrap();
        let before = pool.count(pair(4, 3));
        let len = pool.len();
        pool.reinforce_wrong(pair(4, 3), &mut rng);
        assert_eq!(pool.count(pair(4, 3)), before + 1);
        assert_eq!(pool.len(), len + 1);
    }

    #[test]
    fn test_reinforce_correct_keeps_last_occurrence() {
        let mut pool = CombinationPool::from_pairs(vec![pair(2, 3), pair(4, 5)]).unwrap();
        assert!(!pool.reinforce_correct(pair(2, 3)));
        assert_eq!(pool.count(pair(2, 3)), 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_reinforce_correct_removes_one_duplicate() {
        let mut pool =
            CombinationPool::from_pairs(vec![pair(2, 3), pair(4, 5), pair(2, 3), pair(2, 3)])
                .unwrap();
        assert!(pool.reinforce_correct(pair(2, 3)));
        assert_eq!(pool.count(pair(2, 3)), 2);
        assert_eq!(pool.pairs()[0], pair(4, 5));
    }

    #[test]
    fn test_reinforce_correct_duplicate_at_front() {
        // The second occurrence sitting right after the first still counts.
        let mut pool = CombinationPool::from_pairs(vec![pair(6, 7), pair(6, 7)]).unwrap();
        assert!(pool.reinforce_correct(pair(6, 7)));
        assert_eq!(pool.pairs(), &[pair(6, 7)]);
    }

    #[test]
    fn test_reinforce_correct_unknown_pair_is_noop() {
        let mut pool = CombinationPool::from_pairs(vec![pair(2, 3)]).unwrap();
        assert!(!pool.reinforce_correct(pair(9, 9)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_never_empties() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut pool = CombinationPool::generate(5, 2).unwrap();
        for step in 0..2000 {
            let drawn = pool.draw(&mut rng);
            if rng.gen_bool(0.8) {
                let before = pool.count(drawn);
                pool.reinforce_correct(drawn);
                let after = pool.count(drawn);
                assert!(before - after <= 1);
                assert!(after >= 1);
            } else {
                pool.reinforce_wrong(drawn, &mut rng);
            }
            assert!(!pool.is_empty(), "pool emptied at step {step}");
        }
        // Every fact survives endless correct answers.
        assert_eq!(pool.weights().len(), CombinationPool::generate(5, 1).unwrap().weights().len());
    }

    #[test]
    fn test_draw_follows_occurrence_weight() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut pairs = vec![pair(2, 2); 9];
        pairs.push(pair(3, 3));
        let pool = CombinationPool::from_pairs(pairs).unwrap();
        let heavy = (0..5000).filter(|_| pool.draw(&mut rng) == pair(2, 2)).count();
        // Expect ~90%
        assert!(heavy > 4300 && heavy < 4700, "heavy pair drawn {heavy} times");
    }

    #[test]
    fn test_rejects_factors_outside_range() {
        assert_eq!(
            CombinationPool::from_pairs(vec![pair(2, 3), pair(70_000, 70_000)]),
            Err(PoolError::FactorOutOfRange { a: 70_000, b: 70_000 })
        );
        assert_eq!(
            CombinationPool::from_pairs(vec![pair(1, 5)]),
            Err(PoolError::FactorOutOfRange { a: 1, b: 5 })
        );
        assert_eq!(
            CombinationPool::generate(21, 1),
            Err(PoolError::FactorOutOfRange { a: 2, b: 21 })
        );
        assert!(CombinationPool::generate(20, 1).is_ok());
        assert!(serde_json::from_str::<CombinationPool>("[[2, 3], [0, 4]]").is_err());
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let pool = CombinationPool::from_pairs(vec![pair(2, 3), pair(3, 2)]).unwrap();
        let json = serde_json::to_string(&pool).unwrap();
        assert_eq!(json, "[[2,3],[3,2]]");
        let back: CombinationPool = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pool);
    }

    #[test]
    fn test_deserialize_rejects_empty_and_bad_arity() {
        assert!(serde_json::from_str::<CombinationPool>("[]").is_err());
        assert!(serde_json::from_str::<CombinationPool>("[[2,3,4]]").is_err());
        assert!(serde_json::from_str::<CombinationPool>("[[2]]").is_err());
    }
}
