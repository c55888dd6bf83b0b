pub mod invariants;
pub mod rbtree;
