//! Lazy k-combination enumeration
//!
//! Combinations are produced as index vectors in lexicographic order: the
//! first index is fixed while every completion over the later indices is
//! produced, then it advances. This is the order of the classic recursive
//! "choose" construction, and the candidate budget truncates it at a
//! reproducible point.

/// Iterator over all `k`-element index combinations of `0..n`
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Combinations {
    /// Enumerate `k`-combinations of `n` items; empty when `k == 0` or `k > n`
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            exhausted: k == 0 || k > n,
        }
    }

    /// Step `indices` to the next combination, returning false after the last one
    fn advance(&mut self) -> bool {
        let k = self.indices.len();
        // Rightmost position that can still move right
        let Some(pos) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
            return false;
        };

        self.indices[pos] += 1;
        for i in pos + 1..k {
            self.indices[i] = self.indices[i - 1] + 1;
        }
        true
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        if !self.started {
            self.started = true;
        } else if !self.advance() {
            self.exhausted = true;
            return None;
        }

        Some(self.indices.clone())
    }
}

/// Number of `k`-combinations of `n` items, saturating at `u128::MAX`
pub fn combination_count(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut count: u128 = 1;
    for i in 0..k {
        // count * (n - i) / (i + 1) stays integral at every step
        count = match count.checked_mul((n - i) as u128) {
            Some(product) => product / (i as u128 + 1),
            None => return u128::MAX,
        };
    }
    count
}
