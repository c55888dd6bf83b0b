use thiserror::Error;

use super::rbtree::{is_red, Color, Link, RBTreeSet};

/// A broken red-black invariant. Any of these means the balancing code is
/// wrong; none can be triggered through the public API of a correct tree.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InvariantError {
    #[error("key at depth {depth} is out of order with an ancestor")]
    Unordered { depth: usize },
    #[error("red node at depth {depth} has a red child")]
    RedRed { depth: usize },
    #[error("black height differs below depth {depth}: left {left}, right {right}")]
    BlackHeight {
        depth: usize,
        left: usize,
        right: usize,
    },
    #[error("root is red")]
    RedRoot,
    #[error("stored length {stored} but {counted} nodes are reachable")]
    LengthMismatch { stored: usize, counted: usize },
}

impl<K: Ord> RBTreeSet<K> {
    /// Walks the whole tree and reports the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if is_red(&self.root) {
            return Err(InvariantError::RedRoot);
        }
        let mut counted = 0;
        check_subtree(&self.root, None, None, 0, &mut counted)?;
        if counted != self.len {
            return Err(InvariantError::LengthMismatch {
                stored: self.len,
                counted,
            });
        }
        Ok(())
    }
}

/// Returns the black height of the subtree, empty slots counting as black.
fn check_subtree<K: Ord>(
    link: &Link<K>,
    lower: Option<&K>,
    upper: Option<&K>,
    depth: usize,
    counted: &mut usize,
) -> Result<usize, InvariantError> {
    let Some(node) = link else {
        return Ok(1);
    };
    *counted += 1;

    let above_lower = lower.map_or(true, |lower| lower < &node.key);
    let below_upper = upper.map_or(true, |upper| &node.key < upper);
    if !above_lower || !below_upper {
        return Err(InvariantError::Unordered { depth });
    }

    if node.color == Color::Red && (is_red(&node.left) || is_red(&node.right)) {
        return Err(InvariantError::RedRed { depth });
    }

    let left = check_subtree(&node.left, lower, Some(&node.key), depth + 1, counted)?;
    let right = check_subtree(&node.right, Some(&node.key), upper, depth + 1, counted)?;
    if left != right {
        return Err(InvariantError::BlackHeight { depth, left, right });
    }

    Ok(left + usize::from(node.color == Color::Black))
}
