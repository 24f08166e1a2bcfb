//! Tuning knobs for a [`QuadTree`](crate::QuadTree).

use crate::QuadTreeError;

pub const DEFAULT_MAX_PER_LEAF: usize = 10;
pub const DEFAULT_MIN_DIM: f64 = 1.0;

/// Subdivision and growth limits for a tree.
///
/// A leaf splits into four children once holding one more element would bring
/// it to `max_per_leaf`, unless it has hit a floor: its shorter side is at or
/// below `min_dim`, or its level has reached `max_depth`. Leaves on a floor keep
/// accepting elements without splitting.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub max_per_leaf: usize,
    pub min_dim: f64,
    pub max_depth: Option<i32>,
    pub allow_expansion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_per_leaf: DEFAULT_MAX_PER_LEAF,
            min_dim: DEFAULT_MIN_DIM,
            max_depth: None,
            allow_expansion: false,
        }
    }
}

impl Config {
    pub fn with_max_per_leaf(mut self, max_per_leaf: usize) -> Self {
        self.max_per_leaf = max_per_leaf;
        self
    }

    pub fn with_min_dim(mut self, min_dim: f64) -> Self {
        self.min_dim = min_dim;
        self
    }

    pub fn with_max_depth(mut self, max_depth: i32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_expansion(mut self, allow_expansion: bool) -> Self {
        self.allow_expansion = allow_expansion;
        self
    }

    pub fn validate(&self) -> Result<(), QuadTreeError> {
        if self.max_per_leaf == 0 {
            return Err(QuadTreeError::InvalidConfig("max_per_leaf must be at least 1"));
        }
        if self.min_dim.is_nan() || self.min_dim < 0.0 {
            return Err(QuadTreeError::InvalidConfig("min_dim must be a non-negative number"));
        }
        // Without either floor a cluster of identical elements splits forever.
        if self.min_dim == 0.0 && self.max_depth.is_none() {
            return Err(QuadTreeError::InvalidConfig(
                "either min_dim must be positive or max_depth must be set",
            ));
        }
        Ok(())
    }

    /// Whether a node with `frame_min_side` at `level` may still split.
    pub(crate) fn can_subdivide(&self, frame_min_side: f64, level: i32) -> bool {
        if frame_min_side <= self.min_dim {
            return false;
        }
        match self.max_depth {
            Some(max_depth) => level < max_depth,
            None => true,
        }
    }
}
