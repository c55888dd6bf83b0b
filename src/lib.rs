pub mod data_structures;
pub mod stress;

pub use data_structures::invariants::InvariantError;
pub use data_structures::rbtree::RBTreeSet;
pub use stress::{Operation, StressConfig, StressError, StressReport};

#[cfg(test)]
pub(crate) fn init_test_logger() {
    use simplelog::{Config, LevelFilter, TestLogger};
    // Every test in the binary shares one global logger; only the first init wins.
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}
