//! A dynamic quadtree over axis-aligned rectangles.
//!
//! Elements expose their bounds through [`Locatable`] and are keyed by their
//! own `Eq + Hash` identity, so inserting the same element twice is a no-op.
//! The bounds are read once at insertion and cached; range queries never call
//! back into the element.
//!
//! ```rust
//! use rect_quadtree::{Config, DVec2, Locatable, QuadTree, Rect};
//!
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct Sprite(u32);
//!
//! impl Locatable for Sprite {
//!     fn bounds(&self) -> Rect {
//!         Rect::new(self.0 as f64 * 10.0, 0.0, 8.0, 8.0)
//!     }
//! }
//!
//! let config = Config::default().with_expansion(true);
//! let mut tree = QuadTree::with_size(DVec2::splat(100.0), config).unwrap();
//! for id in 0..20 {
//!     tree.insert(Sprite(id)).unwrap();
//! }
//!
//! // Sprites past x = 100 made the frame grow.
//! assert_eq!(tree.frame(), Rect::new(0.0, 0.0, 200.0, 200.0));
//! assert_eq!(tree.query(&Rect::new(0.0, 0.0, 25.0, 5.0)).len(), 3);
//! ```

use std::hash::Hash;

mod config;
mod error;
mod geometry;
mod list;
mod node;
mod quadtree;

/// Anything with rectangular bounds and a stable identity.
pub trait Locatable: Eq + Hash + Clone {
    fn bounds(&self) -> Rect;
}

/// Stateful visitor for [`QuadTree::traverse`]. Return `false` to stop.
pub trait Visitor<E> {
    fn visit(&mut self, node: NodeView<'_, E>) -> bool;
}

pub use config::*;
pub use error::*;
pub use geometry::*;
pub use node::NodeView;
pub use quadtree::*;

pub use glam::DVec2;

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    static NEXT_ID: AtomicU32 = AtomicU32::new(1);

    /// Test element: a fresh id for every instance, so equal frames are still
    /// distinct elements.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub(crate) struct Item {
        pub id: u32,
        pub frame: Rect,
    }

    // Lets bare rectangles act as elements, compared by exact coordinates.
    impl Eq for Rect {}

    impl Hash for Rect {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.origin.x.to_bits().hash(state);
            self.origin.y.to_bits().hash(state);
            self.size.x.to_bits().hash(state);
            self.size.y.to_bits().hash(state);
        }
    }

    impl Item {
        pub fn new(frame: Rect) -> Self {
            Self {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                frame,
            }
        }
    }

    impl Locatable for Item {
        fn bounds(&self) -> Rect {
            self.frame
        }
    }

    impl Locatable for Rect {
        fn bounds(&self) -> Rect {
            *self
        }
    }

    #[derive(Default)]
    struct LeafStats {
        leaves: usize,
        branches: usize,
        overfull_off_floor: usize,
        max_per_leaf: usize,
    }

    impl Visitor<Item> for LeafStats {
        fn visit(&mut self, node: NodeView<'_, Item>) -> bool {
            if node.is_leaf() {
                self.leaves += 1;
                if node.len() > self.max_per_leaf && !node.at_floor() {
                    self.overfull_off_floor += 1;
                }
            } else {
                self.branches += 1;
            }
            true
        }
    }

    fn random_rect(rng: &mut StdRng, span: f64, max_size: f64) -> Rect {
        Rect::new(
            rng.random_range(-0.09 * span..0.99 * span),
            rng.random_range(-0.09 * span..0.99 * span),
            rng.random_range(0.0..max_size),
            rng.random_range(0.0..max_size),
        )
    }

    #[test]
    fn test_insert() {
        let mut tree = QuadTree::with_size(DVec2::splat(100.0), Config::default()).unwrap();
        tree.insert(Rect::new(10.0, 10.0, 10.0, 10.0)).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.frame(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_failed_insert() {
        let mut tree = QuadTree::with_size(DVec2::splat(100.0), Config::default()).unwrap();
        tree.insert(Rect::new(110.0, 10.0, 10.0, 10.0)).unwrap();

        assert_eq!(tree.len(), 0);
        assert_eq!(tree.frame(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_prevent_duplicates() {
        let mut tree = QuadTree::with_size(DVec2::splat(100.0), Config::default()).unwrap();
        for _ in 0..20 {
            tree.insert(Rect::new(10.0, 10.0, 10.0, 10.0)).unwrap();
        }

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_multiple_levels() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), Config::default()).unwrap();
        for _ in 0..200 {
            tree.insert(Item::new(random_rect(&mut rng, 1000.0, 100.0))).unwrap();
        }

        assert!(tree.len() > 50);
        assert!(tree.depth() > 1);
    }

    #[test]
    fn test_capacity_trigger_in_one_quadrant() {
        let config = Config::default();
        let mut tree = QuadTree::with_size(DVec2::splat(100.0), config).unwrap();
        for i in 0..config.max_per_leaf {
            let offset = i as f64 * 4.0;
            tree.insert(Item::new(Rect::new(offset, offset, 2.0, 2.0))).unwrap();
        }

        assert_eq!(tree.len(), config.max_per_leaf);
        assert!(tree.depth() > 1);
    }

    #[test]
    fn test_leaves_respect_capacity_off_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = Config::default().with_max_per_leaf(4).with_min_dim(8.0);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), config).unwrap();
        for _ in 0..500 {
            tree.insert(Item::new(random_rect(&mut rng, 1000.0, 30.0))).unwrap();
        }

        let mut stats = LeafStats {
            max_per_leaf: config.max_per_leaf,
            ..Default::default()
        };
        tree.traverse(&mut stats);
        assert_eq!(stats.overfull_off_floor, 0);
        assert!(stats.branches > 0);
        assert_eq!(stats.leaves, stats.branches * 3 + 1);
    }

    #[test]
    fn test_query_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = Config::default().with_max_per_leaf(6);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), config).unwrap();

        let mut stored = Vec::new();
        for _ in 0..400 {
            let item = Item::new(random_rect(&mut rng, 1000.0, 80.0));
            if tree.insert(item.clone()).unwrap() == Insertion::Inserted {
                stored.push(item);
            }
        }
        assert_eq!(tree.len(), stored.len());

        for _ in 0..100 {
            // Matches outside the frame are never indexed, so clip to it.
            let query = random_rect(&mut rng, 1000.0, 300.0).intersection(&tree.frame());
            if query.is_null() {
                continue;
            }
            let expected: HashSet<Item> = stored
                .iter()
                .filter(|item| item.frame.intersects(&query))
                .cloned()
                .collect();
            assert_eq!(tree.query(&query), expected, "query {:?}", query);
        }
    }

    #[test]
    fn test_expanding_tree_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(1234);
        let config = Config::default().with_max_per_leaf(5).with_expansion(true);
        let mut tree = QuadTree::with_size(DVec2::splat(100.0), config).unwrap();

        let mut stored = Vec::new();
        for _ in 0..300 {
            let frame = Rect::new(
                rng.random_range(-2000.0..2000.0),
                rng.random_range(-2000.0..2000.0),
                rng.random_range(0.0..50.0),
                rng.random_range(0.0..50.0),
            );
            let item = Item::new(frame);
            assert_eq!(tree.insert(item.clone()).unwrap(), Insertion::Inserted);
            stored.push(item);
        }

        for item in &stored {
            assert!(tree.frame().intersects(&item.frame));
        }
        for _ in 0..50 {
            let query = Rect::new(
                rng.random_range(-2000.0..2000.0),
                rng.random_range(-2000.0..2000.0),
                rng.random_range(0.0..800.0),
                rng.random_range(0.0..800.0),
            )
            .intersection(&tree.frame());
            if query.is_null() {
                continue;
            }
            let expected: HashSet<Item> = stored
                .iter()
                .filter(|item| item.frame.intersects(&query))
                .cloned()
                .collect();
            assert_eq!(tree.query(&query), expected, "query {:?}", query);
        }
    }

    #[test]
    fn test_expansion() {
        let config = Config::default().with_expansion(true);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), config).unwrap();
        let depth = tree.depth();
        let item = Item::new(Rect::new(1750.0, 1750.0, 100.0, 100.0));

        assert_eq!(tree.insert(item.clone()), Ok(Insertion::Inserted));
        assert_eq!(tree.frame(), Rect::new(0.0, 0.0, 2000.0, 2000.0));
        assert_eq!(tree.depth(), depth + 1);

        let found = tree.query(&Rect::new(1000.0, 1000.0, 1000.0, 1000.0));
        assert_eq!(found, HashSet::from([item]));
    }

    #[test]
    fn test_far_expansion_is_power_of_two() {
        let config = Config::default().with_expansion(true);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), config).unwrap();
        let item = Item::new(Rect::new(-37_250.0, 52_250.0, 10.0, 10.0));
        tree.insert(item.clone()).unwrap();

        let frame = tree.frame();
        let scale = frame.width() / 1000.0;
        assert_eq!(frame.width(), frame.height());
        assert_eq!(scale, scale.log2().round().exp2());
        assert!(frame.contains(&item.frame));
        assert!(tree.query(&item.frame).contains(&item));
    }

    #[test]
    fn test_non_expandable_tree_drops_far_elements() {
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), Config::default()).unwrap();
        let outcome = tree.insert(Item::new(Rect::new(1750.0, 1750.0, 100.0, 100.0)));

        assert_eq!(outcome, Ok(Insertion::OutOfBounds));
        assert_eq!(tree.frame(), Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_walk_early_exit() {
        let mut rng = StdRng::seed_from_u64(99);
        let config = Config::default().with_max_per_leaf(3);
        let mut tree = QuadTree::with_size(DVec2::splat(1000.0), config).unwrap();
        for _ in 0..100 {
            tree.insert(Item::new(random_rect(&mut rng, 1000.0, 40.0))).unwrap();
        }

        let mut visits = 0;
        tree.walk(|_| {
            visits += 1;
            visits != 5
        });
        assert_eq!(visits, 5);
    }
}
