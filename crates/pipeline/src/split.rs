//! Deterministic train/evaluation split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices partitioned into training and evaluation subsets.
///
/// The two sides are disjoint and together cover every input row; the same
/// (n, fraction, seed) always reproduces the identical partition, which is
/// what makes model comparisons on the evaluation side meaningful.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `0..n` into training and evaluation indices.
pub fn split_rows(n: usize, train_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let cut = ((n as f64) * train_fraction).round() as usize;
    let cut = cut.min(n);
    let test = indices.split_off(cut);
    Split {
        train: indices,
        test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let split = split_rows(100, 0.75, 42);

        assert_eq!(split.train.len() + split.test.len(), 100);
        let train: HashSet<_> = split.train.iter().collect();
        let test: HashSet<_> = split.test.iter().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 100);
    }

    #[test]
    fn test_split_ratio() {
        let split = split_rows(1000, 0.75, 42);
        assert_eq!(split.train.len(), 750);
        assert_eq!(split.test.len(), 250);
    }

    #[test]
    fn test_same_seed_reproduces_partition() {
        let a = split_rows(500, 0.75, 7);
        let b = split_rows(500, 0.75, 7);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = split_rows(500, 0.75, 7);
        let b = split_rows(500, 0.75, 8);
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn test_empty_input() {
        let split = split_rows(0, 0.75, 1);
        assert!(split.train.is_empty());
        assert!(split.test.is_empty());
    }
}
