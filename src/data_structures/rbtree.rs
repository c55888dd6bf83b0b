use std::cmp::Ordering;

use log::trace;

pub(crate) type Link<K> = Option<Box<Node<K>>>;

/// An ordered set of unique keys kept balanced as a red-black tree.
///
/// Every node owns its two child slots outright, so dropping the set drops
/// every key. Fix-ups never store parent pointers: insertion and removal
/// recurse down the search path and repair the tree as the recursion
/// unwinds, so each stack frame plays the role of the parent link.
#[derive(Debug)]
pub struct RBTreeSet<K> {
    pub(crate) root: Link<K>,
    pub(crate) len: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Removal {
    Absent,
    Balanced,
    /// The subtree lost one black node on every path (double-black deficit).
    Short,
}

#[derive(Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) color: Color,
    pub(crate) left: Link<K>,
    pub(crate) right: Link<K>,
}

impl<K> Node<K> {
    fn new(key: K) -> Box<Self> {
        Box::new(Node {
            key,
            color: Color::Red,
            left: None,
            right: None,
        })
    }

    pub(crate) fn child(&self, side: Side) -> &Link<K> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Link<K> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Empty slots count as black.
pub(crate) fn is_red<K>(link: &Link<K>) -> bool {
    matches!(link, Some(node) if node.color == Color::Red)
}

fn paint<K>(link: &mut Link<K>, color: Color) {
    if let Some(node) = link {
        node.color = color;
    }
}

/// Rotates `top` towards `side`: the child on the opposite side takes its
/// place and `top` becomes that child's `side` child. In-order key sequence is
/// unchanged. A missing pivot leaves the subtree untouched.
pub(crate) fn rotate<K>(mut top: Box<Node<K>>, side: Side) -> Box<Node<K>> {
    let Some(mut pivot) = top.child_mut(side.opposite()).take() else {
        return top;
    };
    *top.child_mut(side.opposite()) = pivot.child_mut(side).take();
    *pivot.child_mut(side) = Some(top);
    pivot
}

impl<K> Default for RBTreeSet<K> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K: Ord> RBTreeSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, key: &K) -> bool {
        let mut current = &self.root;
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Less => current = &node.left,
                Ordering::Equal => return true,
                Ordering::Greater => current = &node.right,
            }
        }
        false
    }

    /// Adds `key`, returning `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        let (mut root, inserted) = Self::insert_at(self.root.take(), key);
        root.color = Color::Black;
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        debug_assert!(!is_red(&self.root), "root left red after insert");
        inserted
    }

    /// Removes `key`, returning `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool {
        let (root, removal) = Self::erase_at(self.root.take(), key);
        self.root = root;
        if removal == Removal::Absent {
            return false;
        }
        paint(&mut self.root, Color::Black);
        self.len -= 1;
        debug_assert_eq!(self.root.is_none(), self.len == 0);
        true
    }

    fn insert_at(link: Link<K>, key: K) -> (Box<Node<K>>, bool) {
        let Some(mut node) = link else {
            return (Node::new(key), true);
        };
        let side = match key.cmp(&node.key) {
            Ordering::Less => Side::Left,
            Ordering::Equal => return (node, false),
            Ordering::Greater => Side::Right,
        };

        let (child, inserted) = Self::insert_at(node.child_mut(side).take(), key);
        *node.child_mut(side) = Some(child);
        if !inserted {
            return (node, false);
        }
        (Self::fix_red_red(node, side), true)
    }

    /// Resolves a red child on `side` of `node` that itself has a red child.
    /// `node` is the grandparent of the offending red node.
    fn fix_red_red(mut node: Box<Node<K>>, side: Side) -> Box<Node<K>> {
        let (parent_red, outer_red, inner_red) = match node.child(side) {
            Some(parent) => (
                parent.color == Color::Red,
                is_red(parent.child(side)),
                is_red(parent.child(side.opposite())),
            ),
            None => (false, false, false),
        };
        if !parent_red || !(outer_red || inner_red) {
            return node;
        }

        if is_red(node.child(side.opposite())) {
            trace!("insert fix-up: red uncle, pushing red upwards");
            node.color = Color::Red;
            paint(&mut node.left, Color::Black);
            paint(&mut node.right, Color::Black);
            return node;
        }

        if !outer_red {
            trace!("insert fix-up: inner grandchild, rotating parent");
            let parent = node.child_mut(side).take();
            *node.child_mut(side) = parent.map(|parent| rotate(parent, side));
        }

        trace!("insert fix-up: outer grandchild, rotating grandparent");
        let mut top = rotate(node, side.opposite());
        top.color = Color::Black;
        paint(top.child_mut(side.opposite()), Color::Red);
        top
    }

    fn erase_at(link: Link<K>, key: &K) -> (Link<K>, Removal) {
        let Some(mut node) = link else {
            return (None, Removal::Absent);
        };
        let side = match key.cmp(&node.key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                return match (node.left.is_some(), node.right.take()) {
                    (true, Some(right)) => {
                        trace!("erase: two children, promoting in-order successor");
                        let (right, successor, short) = Self::remove_min(right);
                        node.right = right;
                        node.key = successor;
                        Self::settle(node, Side::Right, short)
                    }
                    (_, right) => {
                        node.right = right;
                        let (child, _, short) = Self::unlink(node);
                        (child, if short { Removal::Short } else { Removal::Balanced })
                    }
                };
            }
        };

        let (child, removal) = Self::erase_at(node.child_mut(side).take(), key);
        *node.child_mut(side) = child;
        match removal {
            Removal::Short => Self::settle(node, side, true),
            other => (Some(node), other),
        }
    }

    /// Detaches the smallest key of the subtree, returning the remaining
    /// subtree, the key, and whether the subtree came out one black short.
    fn remove_min(mut node: Box<Node<K>>) -> (Link<K>, K, bool) {
        match node.left.take() {
            None => Self::unlink(node),
            Some(left) => {
                let (left, min, short) = Self::remove_min(left);
                node.left = left;
                let (link, removal) = Self::settle(node, Side::Left, short);
                (link, min, removal == Removal::Short)
            }
        }
    }

    /// Splices out a node with at most one child, handing its slot to that
    /// child. Removing a black node shortens the path unless a red child can
    /// absorb the missing black.
    fn unlink(node: Box<Node<K>>) -> (Link<K>, K, bool) {
        let Node {
            key,
            color,
            left,
            right,
        } = *node;
        debug_assert!(left.is_none() || right.is_none());

        let mut child = left.or(right);
        let short = match (color, child.as_mut()) {
            (Color::Red, _) => false,
            (Color::Black, Some(child)) if child.color == Color::Red => {
                child.color = Color::Black;
                false
            }
            (Color::Black, _) => true,
        };
        (child, key, short)
    }

    fn settle(node: Box<Node<K>>, side: Side, short: bool) -> (Link<K>, Removal) {
        if !short {
            return (Some(node), Removal::Balanced);
        }
        let (top, short) = Self::fix_double_black(node, side);
        (Some(top), if short { Removal::Short } else { Removal::Balanced })
    }

    /// Repairs `node` whose child on `side` is one black short. Returns the new
    /// subtree root and whether the deficit moved up to the caller.
    fn fix_double_black(mut node: Box<Node<K>>, side: Side) -> (Box<Node<K>>, bool) {
        let sibling_side = side.opposite();

        if is_red(node.child(sibling_side)) {
            trace!("erase fix-up: red sibling, rotating parent");
            node.color = Color::Red;
            let mut top = rotate(node, side);
            top.color = Color::Black;
            let mut short = false;
            if let Some(parent) = top.child_mut(side).take() {
                // The lowered parent is red now, so this pass always ends here.
                let (parent, deficit) = Self::fix_double_black(parent, side);
                *top.child_mut(side) = Some(parent);
                short = deficit;
            }
            return (top, short);
        }

        let (near_red, far_red) = match node.child(sibling_side) {
            Some(sibling) => (is_red(sibling.child(side)), is_red(sibling.child(sibling_side))),
            None => (false, false),
        };

        if !near_red && !far_red {
            trace!("erase fix-up: black sibling with black children, recoloring");
            paint(node.child_mut(sibling_side), Color::Red);
            if node.color == Color::Red {
                node.color = Color::Black;
                return (node, false);
            }
            return (node, true);
        }

        if !far_red {
            trace!("erase fix-up: red near nephew, rotating sibling");
            let sibling = node.child_mut(sibling_side).take();
            *node.child_mut(sibling_side) = sibling.map(|sibling| {
                let mut sibling = rotate(sibling, sibling_side);
                sibling.color = Color::Black;
                paint(sibling.child_mut(sibling_side), Color::Red);
                sibling
            });
        }

        trace!("erase fix-up: red far nephew, rotating parent");
        let parent_color = node.color;
        let mut top = rotate(node, side);
        top.color = parent_color;
        paint(top.child_mut(side), Color::Black);
        paint(top.child_mut(sibling_side), Color::Black);
        (top, false)
    }

    /// Edges from the root down to the deepest node; 0 for an empty tree or a
    /// lone root.
    pub fn max_depth(&self) -> usize {
        self.below_root(usize::max, |_| 1)
    }

    /// Edges from the root down to the shallowest node with an empty slot.
    pub fn min_depth(&self) -> usize {
        self.below_root(usize::min, |_| 1)
    }

    /// Black nodes under the root on the blackest path, i.e. the black height
    /// of the root. The root itself is not counted.
    pub fn max_black_depth(&self) -> usize {
        self.below_root(usize::max, black_weight)
    }

    pub fn min_black_depth(&self) -> usize {
        self.below_root(usize::min, black_weight)
    }

    fn below_root(&self, pick: fn(usize, usize) -> usize, weight: fn(&Node<K>) -> usize) -> usize {
        match &self.root {
            None => 0,
            Some(root) => pick(
                path_depth(&root.left, pick, weight),
                path_depth(&root.right, pick, weight),
            ),
        }
    }
}

fn black_weight<K>(node: &Node<K>) -> usize {
    match node.color {
        Color::Black => 1,
        Color::Red => 0,
    }
}

fn path_depth<K>(
    link: &Link<K>,
    pick: fn(usize, usize) -> usize,
    weight: fn(&Node<K>) -> usize,
) -> usize {
    match link {
        None => 0,
        Some(node) => {
            weight(node)
                + pick(
                    path_depth(&node.left, pick, weight),
                    path_depth(&node.right, pick, weight),
                )
        }
    }
}
