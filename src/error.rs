//! Error types for the quadtree.

use thiserror::Error;

use crate::Rect;

/// Errors reported by tree construction and insertion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadTreeError {
    #[error("Invalid geometry {rect:?}: {reason}")]
    InvalidGeometry { rect: Rect, reason: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Expanding frame {frame:?} overflows finite coordinates")]
    ExpansionOverflow { frame: Rect },
}
