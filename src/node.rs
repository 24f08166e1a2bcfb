use std::collections::HashMap;

use crate::{Config, Rect};

pub(crate) type NodeId = i32;

/// What a node holds. Elements are keyed by identity and carry the bounds
/// captured when they were inserted.
#[derive(Clone, Debug)]
pub(crate) enum Storage<E> {
    Leaf {
        elements: HashMap<E, Rect>,
    },
    /// Children in top-left, top-right, bottom-left, bottom-right order.
    /// `covering` holds elements whose bounds contain the whole frame.
    Branch {
        children: [NodeId; 4],
        covering: HashMap<E, Rect>,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct Node<E> {
    pub frame: Rect,
    pub level: i32,
    pub storage: Storage<E>,
}

impl<E> Node<E> {
    pub fn leaf(frame: Rect, level: i32) -> Self {
        Self {
            frame,
            level,
            storage: Storage::Leaf {
                elements: HashMap::new(),
            },
        }
    }

    pub fn branch(frame: Rect, level: i32, children: [NodeId; 4]) -> Self {
        Self {
            frame,
            level,
            storage: Storage::Branch {
                children,
                covering: HashMap::new(),
            },
        }
    }

    /// Elements stored directly on this node.
    pub fn held(&self) -> &HashMap<E, Rect> {
        match &self.storage {
            Storage::Leaf { elements } => elements,
            Storage::Branch { covering, .. } => covering,
        }
    }

    pub fn children(&self) -> Option<&[NodeId; 4]> {
        match &self.storage {
            Storage::Leaf { .. } => None,
            Storage::Branch { children, .. } => Some(children),
        }
    }

    pub fn into_held(self) -> HashMap<E, Rect> {
        match self.storage {
            Storage::Leaf { elements } => elements,
            Storage::Branch { covering, .. } => covering,
        }
    }
}

/// Read-only look at one node during a walk.
pub struct NodeView<'a, E> {
    pub(crate) node: &'a Node<E>,
    pub(crate) config: &'a Config,
    pub(crate) is_root: bool,
}

impl<'a, E> Clone for NodeView<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E> Copy for NodeView<'a, E> {}

impl<'a, E> NodeView<'a, E> {
    pub fn frame(&self) -> Rect {
        self.node.frame
    }

    /// Depth marker: 1 for the root of a fresh tree, one more per
    /// subdivision, one less per expansion.
    pub fn level(&self) -> i32 {
        self.node.level
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node.storage, Storage::Leaf { .. })
    }

    pub fn is_branch(&self) -> bool {
        !self.is_leaf()
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Number of elements stored directly on this node. For a branch these
    /// are the elements covering its whole frame.
    pub fn len(&self) -> usize {
        self.node.held().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements stored directly on this node, with their cached bounds.
    pub fn elements(&self) -> impl Iterator<Item = (&'a E, &'a Rect)> + 'a {
        self.node.held().iter()
    }

    /// True when the node is too small or too deep to split again.
    pub fn at_floor(&self) -> bool {
        !self
            .config
            .can_subdivide(self.node.frame.min_side(), self.node.level)
    }
}

impl<'a, E> std::fmt::Debug for NodeView<'a, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeView")
            .field("frame", &self.node.frame)
            .field("level", &self.node.level)
            .field("leaf", &self.is_leaf())
            .field("len", &self.len())
            .finish()
    }
}
