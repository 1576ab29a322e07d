//! Dynamic R-tree over integer boxes.
//!
//! Nodes live in an arena owned by the tree. Leaves store a copy of the box
//! given at insertion time and a caller-owned handle (`T`), typically an index
//! into an object arena; the tree never owns or drops what a handle refers to.

use std::fmt::Write as _;

use thiserror::Error;

use crate::geometry::BBox;

/// Maximum number of children per node.
pub const MAX_CHILDREN: usize = 6;
/// Nodes other than the root never hold fewer children than this.
pub const MIN_CHILDREN: usize = 2;

const KMEANS_ROUNDS: usize = 8;

/// Verdict of a leaf predicate during [`RTree::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// Not accepted; keep searching.
    NotFound,
    /// Accepted (counted); keep searching.
    FoundContinue,
    /// Stop the whole search immediately.
    Cancel,
}

/// Result of a search: accepted leaves and whether a predicate cancelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    pub found: usize,
    pub cancelled: bool,
}

/// Structural problems reported by [`RTree::check`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {node}: stored box {stored:?} differs from the union of its children {expected:?}")]
    StaleBounds {
        node: usize,
        stored: BBox,
        expected: BBox,
    },
    #[error("node {node} holds {count} children (maximum {MAX_CHILDREN})")]
    Overfull { node: usize, count: usize },
    #[error("non-root node {node} holds {count} children (minimum {MIN_CHILDREN})")]
    Underfull { node: usize, count: usize },
    #[error("node {node} has a wrong parent link")]
    BrokenParent { node: usize },
    #[error("leaves found at depths {first} and {other}")]
    Unbalanced { first: usize, other: usize },
    #[error("entry with invalid box {0:?}")]
    InvalidEntry(BBox),
    #[error("counted {counted} entries but the tree records {recorded}")]
    SizeMismatch { counted: usize, recorded: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct Entry<T> {
    bbox: BBox,
    item: T,
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(Vec<Entry<T>>),
    Branch(Vec<NodeId>),
}

#[derive(Debug, Clone)]
struct Node<T> {
    bbox: BBox,
    parent: Option<NodeId>,
    kind: NodeKind<T>,
}

impl<T> Node<T> {
    fn empty_leaf(parent: Option<NodeId>) -> Self {
        Self {
            bbox: BBox::EMPTY,
            parent,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Branch(children) => children.len(),
        }
    }
}

/// Spatial index of boxes with non-owning handles.
///
/// Every branch box is the exact union of its children after each `insert`
/// and `delete`. Iteration borrows the tree immutably, so it cannot overlap a
/// mutation.
#[derive(Debug, Clone)]
pub struct RTree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeId>,
    root: NodeId,
    len: usize,
}

impl<T: Copy + PartialEq> Default for RTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + PartialEq> RTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::empty_leaf(None)],
            free: Vec::new(),
            root: NodeId(0),
            len: 0,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Union of every stored box, `None` for an empty tree.
    pub fn bbox(&self) -> Option<BBox> {
        (self.len > 0).then(|| self.node(self.root).bbox)
    }

    /// Number of node levels from the root down to the leaves.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut id = self.root;
        while let NodeKind::Branch(children) = &self.node(id).kind {
            match children.first() {
                Some(&c) => id = c,
                None => break,
            }
            depth += 1;
        }
        depth
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ── Insertion ────────────────────────────────────────────────────

    /// Add one entry. `bbox` must be valid (`x1 <= x2`, `y1 <= y2`).
    pub fn insert(&mut self, bbox: BBox, item: T) {
        debug_assert!(bbox.is_valid(), "refusing to index empty box {bbox:?}");
        self.insert_entry(Entry { bbox, item });
        self.len += 1;
    }

    fn insert_entry(&mut self, entry: Entry<T>) {
        let leaf = self.choose_leaf(&entry.bbox);
        if let NodeKind::Leaf(entries) = &mut self.node_mut(leaf).kind {
            entries.push(entry);
        }

        let mut id = leaf;
        loop {
            if self.node(id).child_count() > MAX_CHILDREN {
                let sibling = self.split(id);
                match self.node(id).parent {
                    Some(parent) => {
                        if let NodeKind::Branch(children) = &mut self.node_mut(parent).kind {
                            children.push(sibling);
                        }
                        id = parent;
                    }
                    None => {
                        let root = self.alloc(Node {
                            bbox: BBox::EMPTY,
                            parent: None,
                            kind: NodeKind::Branch(vec![id, sibling]),
                        });
                        self.node_mut(id).parent = Some(root);
                        self.node_mut(sibling).parent = Some(root);
                        self.root = root;
                        self.refresh_bbox(root);
                        return;
                    }
                }
            } else {
                self.refresh_bbox(id);
                match self.node(id).parent {
                    Some(parent) => id = parent,
                    None => return,
                }
            }
        }
    }

    fn choose_leaf(&self, bbox: &BBox) -> NodeId {
        let mut id = self.root;
        loop {
            let NodeKind::Branch(children) = &self.node(id).kind else {
                return id;
            };
            let Some(next) = self.choose_child(children, bbox) else {
                return id;
            };
            id = next;
        }
    }

    /// Prefer the smallest child already containing the box, else the one
    /// whose area grows least.
    fn choose_child(&self, children: &[NodeId], bbox: &BBox) -> Option<NodeId> {
        let containing = children
            .iter()
            .copied()
            .filter(|&c| self.node(c).bbox.contains_box(bbox))
            .min_by(|&a, &b| self.node(a).bbox.area().total_cmp(&self.node(b).bbox.area()));
        if containing.is_some() {
            return containing;
        }
        let penalty = |c: NodeId| {
            let current = self.node(c).bbox;
            let area = current.area();
            (current.union(bbox).area() - area, area)
        };
        children.iter().copied().min_by(|&a, &b| {
            let (ea, aa) = penalty(a);
            let (eb, ab) = penalty(b);
            ea.total_cmp(&eb).then(aa.total_cmp(&ab))
        })
    }

    /// Move part of an overfull node's children into a new sibling.
    fn split(&mut self, id: NodeId) -> NodeId {
        let parent = self.node(id).parent;
        let kind = std::mem::replace(&mut self.node_mut(id).kind, NodeKind::Leaf(Vec::new()));
        let (keep, moved) = match kind {
            NodeKind::Leaf(entries) => {
                let boxes: Vec<BBox> = entries.iter().map(|e| e.bbox).collect();
                let (keep, moved) = partition(entries, &find_clusters(&boxes));
                (NodeKind::Leaf(keep), NodeKind::Leaf(moved))
            }
            NodeKind::Branch(children) => {
                let boxes: Vec<BBox> = children.iter().map(|&c| self.node(c).bbox).collect();
                let (keep, moved) = partition(children, &find_clusters(&boxes));
                (NodeKind::Branch(keep), NodeKind::Branch(moved))
            }
        };
        self.node_mut(id).kind = keep;
        let sibling = self.alloc(Node {
            bbox: BBox::EMPTY,
            parent,
            kind: moved,
        });
        if let NodeKind::Branch(children) = &self.node(sibling).kind {
            for c in children.clone() {
                self.node_mut(c).parent = Some(sibling);
            }
        }
        self.refresh_bbox(id);
        self.refresh_bbox(sibling);
        sibling
    }

    // ── Deletion ─────────────────────────────────────────────────────

    /// Remove the entry whose stored box and handle both equal the arguments.
    ///
    /// `bbox` must be the box used at insertion; returns `false` when no such
    /// entry exists, leaving the tree unchanged.
    pub fn delete(&mut self, bbox: &BBox, item: &T) -> bool {
        let Some((leaf, pos)) = self.find_entry(bbox, item) else {
            return false;
        };
        if let NodeKind::Leaf(entries) = &mut self.node_mut(leaf).kind {
            entries.swap_remove(pos);
        }
        self.len -= 1;
        self.condense(leaf);
        true
    }

    fn find_entry(&self, bbox: &BBox, item: &T) -> Option<(NodeId, usize)> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Leaf(entries) => {
                    if let Some(pos) = entries
                        .iter()
                        .position(|e| e.bbox == *bbox && e.item == *item)
                    {
                        return Some((id, pos));
                    }
                }
                NodeKind::Branch(children) => stack.extend(
                    children
                        .iter()
                        .copied()
                        .filter(|&c| self.node(c).bbox.contains_box(bbox)),
                ),
            }
        }
        None
    }

    /// Walk from a shrunken leaf to the root, dissolving underfull nodes and
    /// re-tightening boxes, then reinsert the orphaned entries.
    fn condense(&mut self, leaf: NodeId) {
        let mut orphans = Vec::new();
        let mut id = leaf;
        while let Some(parent) = self.node(id).parent {
            if self.node(id).child_count() < MIN_CHILDREN {
                if let NodeKind::Branch(children) = &mut self.node_mut(parent).kind {
                    children.retain(|&c| c != id);
                }
                self.release_subtree(id, &mut orphans);
            } else {
                self.refresh_bbox(id);
            }
            id = parent;
        }
        self.refresh_bbox(self.root);

        loop {
            let root = self.root;
            match &self.node(root).kind {
                NodeKind::Branch(children) if children.len() == 1 => {
                    let only = children[0];
                    self.release(root);
                    self.node_mut(only).parent = None;
                    self.root = only;
                }
                NodeKind::Branch(children) if children.is_empty() => {
                    *self.node_mut(root) = Node::empty_leaf(None);
                    break;
                }
                _ => break,
            }
        }

        for entry in orphans {
            self.insert_entry(entry);
        }
    }

    fn release_subtree(&mut self, id: NodeId, orphans: &mut Vec<Entry<T>>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let kind = std::mem::replace(&mut self.node_mut(id).kind, NodeKind::Leaf(Vec::new()));
            match kind {
                NodeKind::Leaf(entries) => orphans.extend(entries),
                NodeKind::Branch(children) => stack.extend(children),
            }
            self.release(id);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Depth-first search.
    ///
    /// `region` sees the box of every subtree that overlaps `query` and may
    /// prune it by returning `false`. `leaf` runs on every entry whose box
    /// overlaps `query` and decides what counts as found.
    pub fn search<R, L>(&self, query: &BBox, mut region: R, mut leaf: L) -> SearchOutcome
    where
        R: FnMut(&BBox) -> bool,
        L: FnMut(&BBox, &T) -> Dir,
    {
        let mut outcome = SearchOutcome::default();
        let root = self.node(self.root);
        if self.len == 0 || !root.bbox.intersects(query) || !region(&root.bbox) {
            return outcome;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Leaf(entries) => {
                    for e in entries.iter().filter(|e| e.bbox.intersects(query)) {
                        match leaf(&e.bbox, &e.item) {
                            Dir::NotFound => {}
                            Dir::FoundContinue => outcome.found += 1,
                            Dir::Cancel => {
                                outcome.cancelled = true;
                                return outcome;
                            }
                        }
                    }
                }
                NodeKind::Branch(children) => {
                    for &c in children.iter().rev() {
                        let b = &self.node(c).bbox;
                        if b.intersects(query) && region(b) {
                            stack.push(c);
                        }
                    }
                }
            }
        }
        outcome
    }

    /// Search without region pruning.
    pub fn search_leaves<L>(&self, query: &BBox, leaf: L) -> SearchOutcome
    where
        L: FnMut(&BBox, &T) -> Dir,
    {
        self.search(query, |_| true, leaf)
    }

    /// Number of entries overlapping `query`.
    pub fn count_in(&self, query: &BBox) -> usize {
        self.search_leaves(query, |_, _| Dir::FoundContinue).found
    }

    /// Handles of every entry overlapping `query`.
    pub fn search_collect(&self, query: &BBox) -> Vec<T> {
        let mut hits = Vec::new();
        self.search_leaves(query, |_, item| {
            hits.push(*item);
            Dir::FoundContinue
        });
        hits
    }

    /// True when no stored box overlaps `query`.
    pub fn is_region_empty(&self, query: &BBox) -> bool {
        !self.search_leaves(query, |_, _| Dir::Cancel).cancelled
    }

    /// Every entry exactly once, in unspecified but stable order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, None)
    }

    /// Every entry overlapping `query`.
    pub fn iter_in(&self, query: BBox) -> Iter<'_, T> {
        Iter::new(self, Some(query))
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Verify the structural invariants: exact bounds, fan-out limits,
    /// parent links, balanced depth and entry count.
    pub fn check(&self) -> Result<(), TreeError> {
        if self.node(self.root).parent.is_some() {
            return Err(TreeError::BrokenParent { node: self.root.0 });
        }
        let mut leaf_depth = None;
        let mut counted = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let count = node.child_count();
            if count > MAX_CHILDREN {
                return Err(TreeError::Overfull { node: id.0, count });
            }
            if id != self.root && count < MIN_CHILDREN {
                return Err(TreeError::Underfull { node: id.0, count });
            }
            let expected = match &node.kind {
                NodeKind::Leaf(entries) => {
                    match leaf_depth {
                        None => leaf_depth = Some(depth),
                        Some(first) if first != depth => {
                            return Err(TreeError::Unbalanced { first, other: depth });
                        }
                        Some(_) => {}
                    }
                    counted += entries.len();
                    let mut union = BBox::EMPTY;
                    for e in entries {
                        if !e.bbox.is_valid() {
                            return Err(TreeError::InvalidEntry(e.bbox));
                        }
                        union = union.union(&e.bbox);
                    }
                    union
                }
                NodeKind::Branch(children) => {
                    let mut union = BBox::EMPTY;
                    for &c in children {
                        if self.node(c).parent != Some(id) {
                            return Err(TreeError::BrokenParent { node: c.0 });
                        }
                        union = union.union(&self.node(c).bbox);
                        stack.push((c, depth + 1));
                    }
                    union
                }
            };
            if node.bbox != expected {
                return Err(TreeError::StaleBounds {
                    node: id.0,
                    stored: node.bbox,
                    expected,
                });
            }
        }
        if counted != self.len {
            return Err(TreeError::SizeMismatch {
                counted,
                recorded: self.len,
            });
        }
        Ok(())
    }

    /// Indented text rendering of the node structure.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let b = node.bbox;
            let pad = "  ".repeat(depth);
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    let _ = writeln!(
                        out,
                        "{pad}leaf #{} ({}, {}, {}, {}) entries={}",
                        id.0,
                        b.x1,
                        b.y1,
                        b.x2,
                        b.y2,
                        entries.len()
                    );
                    for e in entries {
                        let eb = e.bbox;
                        let _ = writeln!(out, "{pad}  ({}, {}, {}, {})", eb.x1, eb.y1, eb.x2, eb.y2);
                    }
                }
                NodeKind::Branch(children) => {
                    let _ = writeln!(
                        out,
                        "{pad}node #{} ({}, {}, {}, {}) children={}",
                        id.0,
                        b.x1,
                        b.y1,
                        b.x2,
                        b.y2,
                        children.len()
                    );
                    stack.extend(children.iter().rev().map(|&c| (c, depth + 1)));
                }
            }
        }
        out
    }

    // ── Arena ────────────────────────────────────────────────────────

    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = Node::empty_leaf(None);
        self.free.push(id);
    }

    fn refresh_bbox(&mut self, id: NodeId) {
        let bbox = match &self.node(id).kind {
            NodeKind::Leaf(entries) => entries
                .iter()
                .fold(BBox::EMPTY, |acc, e| acc.union(&e.bbox)),
            NodeKind::Branch(children) => children
                .iter()
                .fold(BBox::EMPTY, |acc, &c| acc.union(&self.node(c).bbox)),
        };
        self.node_mut(id).bbox = bbox;
    }
}

/// Split `items` by the side flags computed by [`find_clusters`].
fn partition<I>(items: Vec<I>, side: &[bool]) -> (Vec<I>, Vec<I>) {
    let mut keep = Vec::with_capacity(items.len());
    let mut moved = Vec::with_capacity(items.len());
    for (item, &far) in items.into_iter().zip(side) {
        if far {
            moved.push(item);
        } else {
            keep.push(item);
        }
    }
    (keep, moved)
}

fn centre(b: &BBox) -> (f64, f64) {
    (
        (b.x1 as f64 + b.x2 as f64) / 2.0,
        (b.y1 as f64 + b.y2 as f64) / 2.0,
    )
}

fn dist2(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

/// Two-means clustering of box centres, seeded with the farthest pair.
/// `true` marks members of the second cluster. Both clusters end up with at
/// least [`MIN_CHILDREN`] members.
fn find_clusters(boxes: &[BBox]) -> Vec<bool> {
    let centres: Vec<(f64, f64)> = boxes.iter().map(centre).collect();
    let n = centres.len();
    let (mut s0, mut s1, mut best) = (0, n.saturating_sub(1), -1.0);
    for i in 0..n {
        for j in i + 1..n {
            let d = dist2(centres[i], centres[j]);
            if d > best {
                (s0, s1, best) = (i, j, d);
            }
        }
    }
    let (mut c0, mut c1) = (centres[s0], centres[s1]);
    let mut side = vec![false; n];
    side[s1] = true;

    for _ in 0..KMEANS_ROUNDS {
        let mut changed = false;
        for (i, c) in centres.iter().enumerate() {
            let far = dist2(*c, c1) < dist2(*c, c0);
            if side[i] != far {
                side[i] = far;
                changed = true;
            }
        }
        let mean = |want: bool| {
            let members: Vec<(f64, f64)> = centres
                .iter()
                .zip(&side)
                .filter(|(_, &s)| s == want)
                .map(|(c, _)| *c)
                .collect();
            let k = members.len() as f64;
            (!members.is_empty()).then(|| {
                let (sx, sy) = members
                    .iter()
                    .fold((0.0, 0.0), |(x, y), c| (x + c.0, y + c.1));
                (sx / k, sy / k)
            })
        };
        match (mean(false), mean(true)) {
            (Some(a), Some(b)) => (c0, c1) = (a, b),
            _ => break,
        }
        if !changed {
            break;
        }
    }

    // top up whichever cluster is too small with the members nearest to it
    for want in [true, false] {
        let target = if want { c1 } else { c0 };
        while side.iter().filter(|&&s| s == want).count() < MIN_CHILDREN {
            let candidate = (0..n)
                .filter(|&i| side[i] != want)
                .min_by(|&a, &b| dist2(centres[a], target).total_cmp(&dist2(centres[b], target)));
            match candidate {
                Some(i) => side[i] = want,
                None => break,
            }
        }
    }
    side
}

/// Iterator over `(box, handle)` pairs; see [`RTree::iter`].
pub struct Iter<'a, T> {
    tree: &'a RTree<T>,
    query: Option<BBox>,
    open: Vec<NodeId>,
    ready: std::slice::Iter<'a, Entry<T>>,
}

impl<'a, T: Copy + PartialEq> Iter<'a, T> {
    fn new(tree: &'a RTree<T>, query: Option<BBox>) -> Self {
        let open = if tree.is_empty() { Vec::new() } else { vec![tree.root] };
        Self {
            tree,
            query,
            open,
            ready: [].iter(),
        }
    }

    fn wanted(&self, b: &BBox) -> bool {
        self.query.map_or(true, |q| b.intersects(&q))
    }
}

impl<'a, T: Copy + PartialEq> Iterator for Iter<'a, T> {
    type Item = (BBox, T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.ready.next() {
                if self.wanted(&e.bbox) {
                    return Some((e.bbox, e.item));
                }
                continue;
            }
            let id = self.open.pop()?;
            let tree = self.tree;
            match &tree.node(id).kind {
                NodeKind::Leaf(entries) => self.ready = entries.iter(),
                NodeKind::Branch(children) => {
                    for &c in children.iter().rev() {
                        if self.wanted(&tree.node(c).bbox) {
                            self.open.push(c);
                        }
                    }
                }
            }
        }
    }
}
