use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec2;
use tracing::{debug, trace};

use crate::list::List;
use crate::node::{Node, NodeId, NodeView, Storage};
use crate::{Config, Locatable, QuadTreeError, Rect, Visitor};

/// What [`QuadTree::insert`] did with an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// The element is now stored in the tree.
    Inserted,
    /// An element with the same identity was already stored; nothing changed.
    AlreadyPresent,
    /// The bounds miss the tree's frame and the tree may not grow.
    OutOfBounds,
    /// The bounds are null or infinite and cannot be placed.
    Ignored,
}

/// Whether an insertion landed in at least one node.
#[derive(Default)]
struct Placement {
    stored: bool,
}

enum Step {
    Skip,
    Cover,
    Descend([NodeId; 4]),
    Duplicate,
    Split,
    Store,
}

/// A region quadtree over elements with rectangular bounds.
///
/// Leaves hold up to `max_per_leaf - 1` elements before splitting into four
/// quadrants. Elements spanning several quadrants are stored in each of them;
/// elements covering a branch's entire frame stay on the branch. An
/// expandable tree doubles its frame outward until an out-of-bounds element
/// fits.
#[derive(Clone, Debug)]
pub struct QuadTree<E> {
    root: NodeId,
    config: Config,
    nodes: List<Node<E>>,
    /// Every stored identity with the bounds it was first inserted under.
    index: HashMap<E, Rect>,
}

impl<E> QuadTree<E>
    where
        E: Locatable,
{
    pub fn new(origin: DVec2, size: DVec2, config: Config) -> Result<Self, QuadTreeError> {
        Self::with_frame(Rect::from_origin_size(origin, size), config)
    }

    /// A tree whose frame starts at the origin.
    pub fn with_size(size: DVec2, config: Config) -> Result<Self, QuadTreeError> {
        Self::new(DVec2::ZERO, size, config)
    }

    pub fn with_frame(frame: Rect, config: Config) -> Result<Self, QuadTreeError> {
        config.validate()?;
        frame.validate()?;
        if frame.is_degenerate() || frame.width() <= 0.0 || frame.height() <= 0.0 {
            return Err(QuadTreeError::InvalidGeometry {
                rect: frame,
                reason: "root frame must be finite with positive size",
            });
        }
        let mut nodes = List::new();
        let root = nodes.push(Node::leaf(frame, 1));
        Ok(Self {
            root,
            config,
            nodes,
            index: HashMap::new(),
        })
    }

    pub fn frame(&self) -> Rect {
        self.nodes.get(self.root).frame
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct elements stored.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of levels from the root down to the deepest leaf, counting both.
    pub fn depth(&self) -> usize {
        let root_level = self.nodes.get(self.root).level;
        let mut deepest = root_level;
        self.walk(|node| {
            if node.is_leaf() {
                deepest = deepest.max(node.level());
            }
            true
        });
        (deepest - root_level + 1) as usize
    }

    pub fn insert(&mut self, element: E) -> Result<Insertion, QuadTreeError> {
        let rect = element.bounds();
        rect.validate()?;
        if rect.is_degenerate() {
            debug!(?rect, "ignoring element with degenerate bounds");
            return Ok(Insertion::Ignored);
        }
        if let Some(stored) = self.index.get(&element) {
            trace!(?rect, ?stored, "element already stored");
            return Ok(Insertion::AlreadyPresent);
        }

        if !rect.intersects(&self.frame()) {
            if !self.config.allow_expansion {
                trace!(?rect, frame = ?self.frame(), "element outside frame");
                return Ok(Insertion::OutOfBounds);
            }
            self.expand_to(&rect)?;
        }

        let mut placed = Placement::default();
        self.node_insert(self.root, element.clone(), rect, &mut placed);

        let outcome = if placed.stored {
            self.index.insert(element, rect);
            Insertion::Inserted
        } else {
            Insertion::OutOfBounds
        };
        trace!(?rect, ?outcome, "insert");
        Ok(outcome)
    }

    /// Returns a copy of the tree with `element` inserted, leaving `self` as is.
    pub fn inserting(&self, element: E) -> Result<Self, QuadTreeError> {
        let mut tree = self.clone();
        tree.insert(element)?;
        Ok(tree)
    }

    /// True when an element with this identity is stored.
    pub fn contains(&self, element: &E) -> bool {
        self.index.contains_key(element)
    }

    /// Bounds cached for `element` when it was inserted.
    pub fn bounds_of(&self, element: &E) -> Option<Rect> {
        self.index.get(element).copied()
    }

    /// Every stored element whose cached bounds intersect `rect`.
    ///
    /// Only the part of an element inside the tree's frame is indexed, so an
    /// element overlapping `rect` solely outside the frame is not returned.
    pub fn query(&self, rect: &Rect) -> HashSet<E> {
        let mut out = HashSet::new();
        self.collect(rect, None, &mut out);
        out
    }

    /// Like [`QuadTree::query`] but leaves `omit` out of the result.
    pub fn query_excluding(&self, rect: &Rect, omit: &E) -> HashSet<E> {
        let mut out = HashSet::new();
        self.collect(rect, Some(omit), &mut out);
        out
    }

    /// Adds the results of [`QuadTree::query`] to `out` without clearing it.
    pub fn query_into(&self, rect: &Rect, out: &mut HashSet<E>) {
        self.collect(rect, None, out);
    }

    /// Breadth-first walk from the root. Children are visited top-left,
    /// top-right, bottom-left, bottom-right. Returning `false` from `visit`
    /// stops the walk at once.
    pub fn walk<F>(&self, mut visit: F)
        where
            F: FnMut(NodeView<'_, E>) -> bool,
    {
        let mut to_process = VecDeque::new();
        to_process.push_back(self.root);

        while let Some(idx) = to_process.pop_front() {
            let node = self.nodes.get(idx);
            let view = NodeView {
                node,
                config: &self.config,
                is_root: idx == self.root,
            };
            if !visit(view) {
                return;
            }
            if let Some(children) = node.children() {
                to_process.extend(children.iter().copied());
            }
        }
    }

    /// [`QuadTree::walk`] driven by a stateful [`Visitor`].
    pub fn traverse<V>(&self, visitor: &mut V)
        where
            V: Visitor<E>,
    {
        self.walk(|node| visitor.visit(node));
    }

    fn collect(&self, rect: &Rect, omit: Option<&E>, out: &mut HashSet<E>) {
        let mut to_process = vec![self.root];
        while let Some(idx) = to_process.pop() {
            let node = self.nodes.get(idx);
            if !rect.intersects(&node.frame) {
                continue;
            }
            for (element, bounds) in node.held() {
                if bounds.intersects(rect) && omit != Some(element) && !out.contains(element) {
                    out.insert(element.clone());
                }
            }
            if let Some(children) = node.children() {
                to_process.extend_from_slice(children);
            }
        }
    }

    fn node_insert(&mut self, idx: NodeId, element: E, rect: Rect, placed: &mut Placement) {
        let step = {
            let node = self.nodes.get(idx);
            if !rect.intersects(&node.frame) {
                Step::Skip
            } else {
                match &node.storage {
                    Storage::Branch { children, .. } => {
                        if rect.contains(&node.frame) {
                            Step::Cover
                        } else {
                            Step::Descend(*children)
                        }
                    }
                    Storage::Leaf { elements } => {
                        if elements.contains_key(&element) {
                            Step::Duplicate
                        } else if elements.len() + 1 >= self.config.max_per_leaf
                            && self.config.can_subdivide(node.frame.min_side(), node.level)
                        {
                            Step::Split
                        } else {
                            Step::Store
                        }
                    }
                }
            }
        };

        match step {
            Step::Skip => {}
            Step::Duplicate => {}
            Step::Cover | Step::Store => {
                let held = match &mut self.nodes.get_mut(idx).storage {
                    Storage::Leaf { elements } => elements,
                    Storage::Branch { covering, .. } => covering,
                };
                match held.entry(element) {
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(rect);
                        placed.stored = true;
                    }
                }
            }
            Step::Descend(children) => {
                for child in children {
                    if rect.intersects(&self.nodes.get(child).frame) {
                        self.node_insert(child, element.clone(), rect, placed);
                    }
                }
            }
            Step::Split => {
                self.subdivide(idx);
                self.node_insert(idx, element, rect, placed);
            }
        }
    }

    /// Turns the leaf at `idx` into a branch and pushes its elements down.
    fn subdivide(&mut self, idx: NodeId) {
        let (frame, level) = {
            let node = self.nodes.get(idx);
            (node.frame, node.level)
        };
        let nodes = &mut self.nodes;
        let children = frame
            .quarters()
            .map(|quarter| nodes.push(Node::leaf(quarter, level + 1)));
        let old = self.nodes.replace(idx, Node::branch(frame, level, children));
        let held = old.into_held();
        debug!(?frame, level, elements = held.len(), "subdividing leaf");

        // Elements were counted when first stored; the rebuild only moves them.
        let mut moved = Placement::default();
        for (element, rect) in held {
            self.node_insert(idx, element, rect, &mut moved);
        }
    }

    /// Grows the root until its frame intersects `rect`. Fails without
    /// touching the tree if the frame would stop being finite.
    fn expand_to(&mut self, rect: &Rect) -> Result<(), QuadTreeError> {
        let mut frame = self.frame();
        while !rect.intersects(&frame) {
            let (_, quadrants) = Self::plan_growth(&frame, rect);
            let grown = Self::union_of(&quadrants);
            if !grown.is_finite() || quadrants.iter().any(|quadrant| !quadrant.is_finite()) {
                return Err(QuadTreeError::ExpansionOverflow { frame });
            }
            frame = grown;
        }

        while !rect.intersects(&self.frame()) {
            self.grow_root(rect);
        }
        Ok(())
    }

    fn grow_root(&mut self, rect: &Rect) {
        let old_root = self.root;
        let (frame, level) = {
            let node = self.nodes.get(old_root);
            (node.frame, node.level)
        };
        let (slot, quadrants) = Self::plan_growth(&frame, rect);

        let mut children = [old_root; 4];
        for (i, quadrant) in quadrants.iter().enumerate() {
            if i != slot {
                children[i] = self.nodes.push(Node::leaf(*quadrant, level));
            }
        }
        let grown = Self::union_of(&quadrants);
        self.root = self.nodes.push(Node::branch(grown, level - 1, children));

        // Parts of elements hanging past the old frame were never indexed.
        let overhanging = self.overhanging(old_root, &frame);
        debug!(
            from = ?frame,
            to = ?grown,
            level = level - 1,
            overhanging = overhanging.len(),
            "expanding root"
        );
        let mut moved = Placement::default();
        for (element, rect) in overhanging {
            for (i, &child) in children.iter().enumerate() {
                if i != slot {
                    self.node_insert(child, element.clone(), rect, &mut moved);
                }
            }
        }
    }

    /// Elements stored under `idx` whose bounds reach outside `frame`.
    fn overhanging(&self, idx: NodeId, frame: &Rect) -> HashMap<E, Rect> {
        let mut out = HashMap::new();
        let mut to_process = vec![idx];
        while let Some(idx) = to_process.pop() {
            let node = self.nodes.get(idx);
            for (element, rect) in node.held() {
                if !frame.contains(rect) && !out.contains_key(element) {
                    out.insert(element.clone(), *rect);
                }
            }
            if let Some(children) = node.children() {
                to_process.extend_from_slice(children);
            }
        }
        out
    }

    /// Lays out the current frame and three same-sized siblings so that they
    /// tile a frame twice as wide and tall, extended toward `rect`. Returns the
    /// quadrant the current frame lands in together with all four frames.
    fn plan_growth(frame: &Rect, rect: &Rect) -> (usize, [Rect; 4]) {
        let col = if rect.max_x() > frame.min_x() { 0 } else { 1 };
        let row = if rect.max_y() > frame.min_y() { 0 } else { 1 };

        let mut quadrants = [*frame; 4];
        for (i, quadrant) in quadrants.iter_mut().enumerate() {
            let dx = (i % 2) as f64 - col as f64;
            let dy = (i / 2) as f64 - row as f64;
            if dx != 0.0 || dy != 0.0 {
                *quadrant = frame.offset(DVec2::new(dx * frame.width(), dy * frame.height()));
            }
        }
        (row * 2 + col, quadrants)
    }

    fn union_of(quadrants: &[Rect; 4]) -> Rect {
        quadrants[1..]
            .iter()
            .fold(quadrants[0], |acc, quadrant| acc.union(quadrant))
    }
}
