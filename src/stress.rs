//! Differential stress testing of [`RBTreeSet`] against `std`'s `BTreeSet`.
//!
//! A run draws random keys and operations from a seeded `StdRng`, applies each
//! operation to both sets, and fails on the first observable difference. The
//! full red-black invariant walk runs every `check_interval` iterations and
//! once more at the end, followed by a membership sweep over the whole key range.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;

use crate::data_structures::invariants::InvariantError;
use crate::data_structures::rbtree::RBTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressConfig {
    pub iterations: usize,
    /// Keys are drawn uniformly from `1..=key_range`.
    pub key_range: u64,
    pub seed: u64,
    /// Iterations between full invariant walks. Zero disables the periodic walk.
    pub check_interval: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
            key_range: 3_000_000,
            seed: 0,
            check_interval: 10_000,
        }
    }
}

impl StressConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_key_range(mut self, key_range: u64) -> Self {
        self.key_range = key_range;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_check_interval(mut self, check_interval: usize) -> Self {
        self.check_interval = check_interval;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Contains,
    Insert,
    Erase,
}

#[derive(Debug, Error)]
pub enum StressError {
    #[error("key range must contain at least one key")]
    EmptyKeyRange,
    #[error("iteration {iteration}: {operation:?}({key}) diverged from the reference set: {detail}")]
    Diverged {
        iteration: usize,
        operation: Operation,
        key: u64,
        detail: &'static str,
    },
    #[error("final sweep: contains({key}) returned {actual}, reference holds {expected}")]
    Sweep { key: u64, expected: bool, actual: bool },
    #[error("invariant violated after {iterations} iterations")]
    Invariant {
        iterations: usize,
        #[source]
        source: InvariantError,
    },
}

/// Counters and final tree shape of a successful run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StressReport {
    pub contains_true: usize,
    pub contains_false: usize,
    pub inserts: usize,
    pub erases: usize,
    pub len: usize,
    pub max_depth: usize,
    pub min_depth: usize,
    pub max_black_depth: usize,
    pub min_black_depth: usize,
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RBTreeSet stress run passed with {} keys", self.len)?;
        writeln!(f, "Depth: max={}; min={}", self.max_depth, self.min_depth)?;
        writeln!(
            f,
            "Black depth: max={}; min={}",
            self.max_black_depth, self.min_black_depth
        )?;
        writeln!(f, "#containsTrue={}", self.contains_true)?;
        writeln!(f, "#containsFalse={}", self.contains_false)?;
        writeln!(f, "#insert={}", self.inserts)?;
        write!(f, "#erase={}", self.erases)
    }
}

pub fn run(config: &StressConfig) -> Result<StressReport, StressError> {
    if config.key_range == 0 {
        return Err(StressError::EmptyKeyRange);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut harness = Harness::default();

    for iteration in 0..config.iterations {
        let key = rng.random_range(1..=config.key_range);
        let operation = match rng.random_range(0..3u8) {
            0 => Operation::Contains,
            1 => Operation::Insert,
            _ => Operation::Erase,
        };
        harness.step(iteration, operation, key)?;

        let done = iteration + 1;
        if config.check_interval > 0 && done % config.check_interval == 0 {
            harness.check(done)?;
            debug!(
                "stress checkpoint: {done} iterations, {} keys, max depth {}",
                harness.tree.len(),
                harness.tree.max_depth()
            );
        }
    }

    let report = harness.finish(config.iterations, config.key_range)?;
    info!("{report}");
    Ok(report)
}

/// The tree under test, the reference set, and the running counters.
#[derive(Debug, Default)]
struct Harness {
    tree: RBTreeSet<u64>,
    reference: BTreeSet<u64>,
    report: StressReport,
}

impl Harness {
    /// Applies one operation to both sets and compares what they report.
    fn step(&mut self, iteration: usize, operation: Operation, key: u64) -> Result<(), StressError> {
        let diverged = |detail| StressError::Diverged {
            iteration,
            operation,
            key,
            detail,
        };
        let tree = &mut self.tree;
        let report = &mut self.report;

        match operation {
            Operation::Contains => {
                let present = self.reference.contains(&key);
                if tree.contains(&key) != present {
                    return Err(diverged("membership differs"));
                }
                if present {
                    report.contains_true += 1;
                } else {
                    report.contains_false += 1;
                }
            }
            Operation::Insert => {
                if tree.insert(key) != self.reference.insert(key) {
                    return Err(diverged("insert disagreed on novelty"));
                }
                report.inserts += 1;
            }
            Operation::Erase => {
                if self.reference.remove(&key) {
                    if !tree.contains(&key) {
                        return Err(diverged("key missing before erase"));
                    }
                    if !tree.erase(&key) {
                        return Err(diverged("erase found nothing to remove"));
                    }
                    report.erases += 1;
                } else {
                    if tree.erase(&key) {
                        return Err(diverged("erase removed an absent key"));
                    }
                    report.contains_false += 1;
                }
                if tree.contains(&key) {
                    return Err(diverged("key survived erase"));
                }
            }
        }

        if tree.len() != self.reference.len() {
            return Err(diverged("length differs"));
        }
        Ok(())
    }

    fn check(&self, iterations: usize) -> Result<(), StressError> {
        self.tree
            .check_invariants()
            .map_err(|source| StressError::Invariant { iterations, source })
    }

    /// Final invariant walk and a membership sweep over `1..=key_range`.
    fn finish(self, iterations: usize, key_range: u64) -> Result<StressReport, StressError> {
        self.check(iterations)?;
        for key in 1..=key_range {
            let expected = self.reference.contains(&key);
            let actual = self.tree.contains(&key);
            if actual != expected {
                return Err(StressError::Sweep {
                    key,
                    expected,
                    actual,
                });
            }
        }

        let tree = &self.tree;
        Ok(StressReport {
            len: tree.len(),
            max_depth: tree.max_depth(),
            min_depth: tree.min_depth(),
            max_black_depth: tree.max_black_depth(),
            min_black_depth: tree.min_black_depth(),
            ..self.report
        })
    }
}
