//! Tree graph search
//!
//! Two-phase breadth-first flood fill over the 26-neighbourhood of a root log.
//!
//! The trunk phase expands only through same-tag logs, honouring the spread
//! index so the search never climbs into a newer trunk of the same species.
//! Matching foliage met on the way is parked in a leaf queue. The canopy phase
//! then drains that queue; every candidate must prove an attachment to this
//! tree's logs through [`is_connected_to_log`] before it is accepted.
//!
//! Both phases share one visited set keyed by position, so no block is
//! processed twice. Traversal is bounded horizontally by a radius around the
//! root; vertical extent is unbounded.

use crate::core_types::position::BlockPos;
use crate::core_types::tag::{leaf_tag_matches, tag_matches};
use crate::world::{ProbedBlock, World, WorldQuery};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Bounds on a single tree search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    /// Maximum horizontal distance from the root
    pub horizontal_radius: f32,
    /// Step bound of the leaf connectivity check
    pub connectivity_depth: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            horizontal_radius: 20.0,
            connectivity_depth: 8,
        }
    }
}

/// Foliage block accepted into a tree, with its distance from the trunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLeaf {
    pub pos: BlockPos,
    /// Canopy steps from the nearest trunk log (adjacent foliage is 1)
    pub distance: u32,
}

/// Result of a tree search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeScan {
    /// Group tag of the root log
    pub tag: Option<String>,
    /// Trunk and branch logs in discovery order, root first
    pub logs: Vec<BlockPos>,
    /// Foliage in discovery order
    pub leaves: Vec<ScannedLeaf>,
}

impl TreeScan {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.leaves.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.logs.len() + self.leaves.len()
    }
}

/// A segmented candidate must not exceed its discoverer's spread index.
/// A missing index on either side imposes no bound.
fn within_spread(candidate: Option<i32>, bound: Option<i32>) -> bool {
    match (candidate, bound) {
        (Some(c), Some(b)) => c <= b,
        _ => true,
    }
}

/// Whether a block belongs to the tree tagged `root_tag` by tag alone
fn is_tree_member(block: &ProbedBlock, root_tag: &str) -> bool {
    match block.tag() {
        Some(tag) if block.kind.is_log() => tag_matches(tag, root_tag),
        Some(tag) if block.kind.is_leaves() => leaf_tag_matches(tag, root_tag),
        _ => false,
    }
}

/// Discover the full structure of the tree rooted at `root`.
///
/// Returns an empty scan when `root` is not a log or carries no tag.
pub fn find_tree<W: World + ?Sized>(
    query: &WorldQuery<'_, W>,
    root: BlockPos,
    limits: &SearchLimits,
) -> TreeScan {
    let Some(root_block) = query.probe(root).filter(|b| b.kind.is_log()) else {
        debug!(%root, "tree search root is not a log");
        return TreeScan::default();
    };
    let Some(root_tag) = root_block.tag().map(str::to_owned) else {
        debug!(%root, code = %root_block.code, "tree search root has no tag");
        return TreeScan::default();
    };

    let in_range = |pos: BlockPos| pos.horizontal_distance(root) <= limits.horizontal_radius;

    let mut visited: FxHashSet<BlockPos> = FxHashSet::default();
    let mut trunk_queue: VecDeque<ProbedBlock> = VecDeque::new();
    let mut leaf_queue: VecDeque<(BlockPos, u32)> = VecDeque::new();
    let mut logs = Vec::new();
    let mut log_set: FxHashSet<BlockPos> = FxHashSet::default();

    visited.insert(root);
    trunk_queue.push_back(root_block);

    // Trunk phase
    while let Some(block) = trunk_queue.pop_front() {
        logs.push(block.pos);
        log_set.insert(block.pos);
        let bound = block.spread_index();

        for neighbor in block.pos.neighbors() {
            if !in_range(neighbor) || visited.contains(&neighbor) {
                continue;
            }
            let Some(candidate) = query.probe(neighbor) else {
                visited.insert(neighbor);
                continue;
            };
            let Some(tag) = candidate.tag() else {
                continue;
            };

            if candidate.kind.is_log() {
                if tag_matches(tag, &root_tag) && within_spread(candidate.spread_index(), bound) {
                    visited.insert(neighbor);
                    trunk_queue.push_back(candidate);
                } else {
                    debug!(pos = %neighbor, tag, root_tag = %root_tag, "skipping foreign trunk log");
                }
            } else if candidate.kind.is_leaves() && leaf_tag_matches(tag, &root_tag) {
                visited.insert(neighbor);
                leaf_queue.push_back((neighbor, 1));
            }
        }
    }

    // Canopy phase
    let mut leaves = Vec::new();
    while let Some((pos, distance)) = leaf_queue.pop_front() {
        let Some(block) = query.probe(pos).filter(|b| is_tree_member(b, &root_tag)) else {
            continue;
        };
        if !is_connected_to_log(query, pos, &root_tag, limits.connectivity_depth, |p| {
            log_set.contains(&p)
        }) {
            debug!(%pos, root_tag = %root_tag, "rejecting detached foliage");
            continue;
        }

        if block.kind.is_log() {
            logs.push(pos);
            log_set.insert(pos);
        } else {
            leaves.push(ScannedLeaf { pos, distance });
        }

        for neighbor in pos.neighbors() {
            if !in_range(neighbor) || visited.contains(&neighbor) {
                continue;
            }
            match query.probe(neighbor) {
                None => {
                    visited.insert(neighbor);
                }
                Some(candidate) if is_tree_member(&candidate, &root_tag) => {
                    visited.insert(neighbor);
                    leaf_queue.push_back((neighbor, distance + 1));
                }
                Some(_) => {}
            }
        }
    }

    debug!(
        %root,
        tag = %root_tag,
        logs = logs.len(),
        leaves = leaves.len(),
        "tree search complete"
    );

    TreeScan {
        tag: Some(root_tag),
        logs,
        leaves,
    }
}

/// Bounded breadth-first check that `start` reaches an anchor log.
///
/// Walks at most `max_depth` steps through blocks tagged for `root_tag` (logs
/// or foliage) and succeeds as soon as a position satisfying `is_anchor` is
/// reached. Foliage that only shares a tag by coincidence, separated by air or
/// another tree, never reaches an anchor.
pub fn is_connected_to_log<W, F>(
    query: &WorldQuery<'_, W>,
    start: BlockPos,
    root_tag: &str,
    max_depth: u32,
    is_anchor: F,
) -> bool
where
    W: World + ?Sized,
    F: Fn(BlockPos) -> bool,
{
    let mut visited: FxHashSet<BlockPos> = FxHashSet::default();
    let mut frontier = VecDeque::from([(start, 0u32)]);
    visited.insert(start);

    while let Some((pos, depth)) = frontier.pop_front() {
        if is_anchor(pos) {
            return true;
        }
        if depth >= max_depth {
            continue;
        }
        for neighbor in pos.neighbors() {
            if !visited.insert(neighbor) {
                continue;
            }
            let member = query
                .probe(neighbor)
                .is_some_and(|b| is_tree_member(&b, root_tag));
            if member {
                frontier.push_back((neighbor, depth + 1));
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::block::BlockClassifier;
    use crate::world::{BlockAttributes, MemoryWorld};

    fn log(world: &mut MemoryWorld, pos: BlockPos, tag: &str) {
        world.place_with(pos, "game:log-grown-oak-ud", BlockAttributes::tagged(tag));
    }

    fn section(world: &mut MemoryWorld, pos: BlockPos, index: i32) {
        world.place_with(
            pos,
            "game:logsection-grown-redwood-ud",
            BlockAttributes::tagged("redwood").with_spread_index(index),
        );
    }

    fn leaf(world: &mut MemoryWorld, pos: BlockPos, tag: &str) {
        world.place_with(pos, "game:leaves-grown-oak", BlockAttributes::tagged(tag));
    }

    fn scan(world: &MemoryWorld, root: BlockPos) -> TreeScan {
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(world, &classifier, 0);
        find_tree(&query, root, &SearchLimits::default())
    }

    #[test]
    fn test_simple_tree() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 64, 0);
        log(&mut world, root, "oak");
        world.place_with(
            BlockPos::new(0, 65, 0),
            "game:log-grown-oak-ud",
            BlockAttributes::tagged("oak").with_spread_index(1),
        );
        leaf(&mut world, BlockPos::new(1, 65, 0), "6oak");

        let result = scan(&world, root);
        assert_eq!(result.tag.as_deref(), Some("oak"));
        assert_eq!(result.logs, vec![root, BlockPos::new(0, 65, 0)]);
        assert_eq!(
            result.leaves,
            vec![ScannedLeaf {
                pos: BlockPos::new(1, 65, 0),
                distance: 1
            }]
        );
    }

    #[test]
    fn test_non_log_root_is_empty() {
        let mut world = MemoryWorld::new();
        leaf(&mut world, BlockPos::new(0, 5, 0), "oak");
        assert!(scan(&world, BlockPos::new(0, 5, 0)).is_empty());
        assert!(scan(&world, BlockPos::new(9, 9, 9)).is_empty());
    }

    #[test]
    fn test_untagged_root_is_empty() {
        let mut world = MemoryWorld::new();
        world.place(BlockPos::new(0, 5, 0), "game:log-oak");
        assert!(scan(&world, BlockPos::new(0, 5, 0)).is_empty());
    }

    #[test]
    fn test_canopy_distance_grows_outward() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 10, 0);
        for dy in 0..3 {
            log(&mut world, root.above(dy), "oak");
        }
        leaf(&mut world, BlockPos::new(1, 12, 0), "6oak");
        leaf(&mut world, BlockPos::new(2, 12, 0), "6oak");
        leaf(&mut world, BlockPos::new(3, 12, 0), "6oak");

        let result = scan(&world, root);
        let distances: Vec<(i32, u32)> = result.leaves.iter().map(|l| (l.pos.x, l.distance)).collect();
        assert_eq!(distances, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_spread_index_blocks_newer_trunk() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 0, 0);
        section(&mut world, root, 2);
        section(&mut world, root.above(1), 1);
        // A newer section of the same tag must not be entered
        section(&mut world, root.above(2), 5);

        let result = scan(&world, root);
        assert_eq!(result.logs, vec![root, root.above(1)]);
    }

    #[test]
    fn test_suffix_tags_join_the_tree() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 0, 0);
        log(&mut world, root, "oak");
        log(&mut world, root.above(1), "bigoak");
        log(&mut world, root.above(2), "birch");

        let result = scan(&world, root);
        assert_eq!(result.logs, vec![root, root.above(1)]);
    }

    #[test]
    fn test_radius_bounds_search() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 0, 0);
        log(&mut world, root, "oak");
        for x in 1..=6 {
            log(&mut world, BlockPos::new(x, 0, 0), "oak");
        }
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let limits = SearchLimits {
            horizontal_radius: 3.0,
            connectivity_depth: 8,
        };

        let result = find_tree(&query, root, &limits);
        assert_eq!(result.logs.len(), 4);
        assert!(result.logs.iter().all(|p| p.x <= 3));
    }

    #[test]
    fn test_foliage_bridge_does_not_cross_air() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 0, 0);
        log(&mut world, root, "oak");
        leaf(&mut world, BlockPos::new(1, 0, 0), "6oak");
        // Gap at x = 2, 3
        leaf(&mut world, BlockPos::new(4, 0, 0), "6oak");

        let result = scan(&world, root);
        assert_eq!(result.leaves.len(), 1);
        assert_eq!(result.leaves[0].pos, BlockPos::new(1, 0, 0));
    }

    #[test]
    fn test_connectivity_depth_limits_reach() {
        let mut world = MemoryWorld::new();
        let anchor = BlockPos::new(0, 0, 0);
        log(&mut world, anchor, "oak");
        for x in 1..=5 {
            leaf(&mut world, BlockPos::new(x, 0, 0), "6oak");
        }
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let is_anchor = |p: BlockPos| p == anchor;

        assert!(is_connected_to_log(&query, BlockPos::new(5, 0, 0), "oak", 5, is_anchor));
        assert!(!is_connected_to_log(&query, BlockPos::new(5, 0, 0), "oak", 4, is_anchor));
        assert!(!is_connected_to_log(&query, BlockPos::new(5, 0, 0), "birch", 8, is_anchor));
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut world = MemoryWorld::new();
        let root = BlockPos::new(0, 0, 0);
        for dy in 0..4 {
            log(&mut world, root.above(dy), "oak");
        }
        for x in -2..=2 {
            for z in -2..=2 {
                if x != 0 || z != 0 {
                    leaf(&mut world, BlockPos::new(x, 4, z), "3oak");
                }
            }
        }

        let first = scan(&world, root);
        assert_eq!(first.logs.len(), 4);
        assert_eq!(first.leaves.len(), 24);
        for _ in 0..5 {
            assert_eq!(scan(&world, root), first);
        }
    }
}
