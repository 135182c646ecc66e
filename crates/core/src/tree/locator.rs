//! Tree locator
//!
//! Maps a fire position to the base of the tree it is burning. Three passes run in
//! a fixed order and the first hit wins:
//!
//! 1. straight down through the fire column (trunk fires)
//! 2. a 5×5×5 cube around the fire, looking for logs
//! 3. the same cube looking for foliage, resolved to its owning trunk
//!
//! Scan order inside each pass is fixed so a world snapshot always resolves to
//! the same base.

use crate::core_types::position::BlockPos;
use crate::core_types::tag::{strip_leaf_prefix, tag_matches};
use crate::world::{ProbedBlock, World, WorldQuery};
use tracing::debug;

/// Vertical steps below the fire checked by the column pass
const COLUMN_DEPTH: i32 = 3;
/// Half-extent of the cube passes (5×5×5)
const CUBE_RADIUS: i32 = 2;
/// Half-extent of the horizontal window used to find a leaf's trunk
const LEAF_WINDOW: i32 = 2;

/// Which locator pass produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatePass {
    Column,
    LogCube,
    LeafCube,
}

/// A resolved tree near a fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedTree {
    /// Canonical base of the tree
    pub base: BlockPos,
    /// Block that matched during the scan
    pub matched: BlockPos,
    pub via: LocatePass,
}

/// Find the tree nearest a fire and resolve its base
pub fn find_nearby_log<W: World + ?Sized>(
    query: &WorldQuery<'_, W>,
    fire: BlockPos,
) -> Option<LocatedTree> {
    for dy in 0..=COLUMN_DEPTH {
        let pos = fire.below(dy);
        if let Some(block) = query.probe(pos).filter(|b| b.kind.is_log()) {
            let base = find_tree_base(query, &block);
            debug!(%fire, log = %pos, %base, "located trunk below fire");
            return Some(LocatedTree {
                base,
                matched: pos,
                via: LocatePass::Column,
            });
        }
    }

    for pos in cube_around(fire) {
        if let Some(block) = query.probe(pos).filter(|b| b.kind.is_log()) {
            let base = find_tree_base(query, &block);
            debug!(%fire, log = %pos, %base, "located log near fire");
            return Some(LocatedTree {
                base,
                matched: pos,
                via: LocatePass::LogCube,
            });
        }
    }

    for pos in cube_around(fire) {
        let Some(block) = query.probe(pos).filter(|b| b.kind.is_leaves()) else {
            continue;
        };
        if let Some(base) = find_tree_base_from_leaf(query, &block) {
            debug!(%fire, leaf = %pos, %base, "located tree through foliage");
            return Some(LocatedTree {
                base,
                matched: pos,
                via: LocatePass::LeafCube,
            });
        }
    }

    debug!(%fire, "no log or leaf near fire");
    None
}

/// Positions of the cube around `center`, y descending then x then z ascending
fn cube_around(center: BlockPos) -> impl Iterator<Item = BlockPos> {
    (-CUBE_RADIUS..=CUBE_RADIUS).rev().flat_map(move |dy| {
        (-CUBE_RADIUS..=CUBE_RADIUS).flat_map(move |dx| {
            (-CUBE_RADIUS..=CUBE_RADIUS).map(move |dz| center.offset(dx, dy, dz))
        })
    })
}

/// Resolve the base of the tree a log belongs to.
///
/// Walks down the column while the block stays a same-tag log, then picks the
/// smallest (z, x) same-tag log on that lowest row so wide trunks resolve to one
/// corner. A log without a tag is its own base.
pub fn find_tree_base<W: World + ?Sized>(query: &WorldQuery<'_, W>, log: &ProbedBlock) -> BlockPos {
    let Some(tag) = log.code.group_segment().or_else(|| log.tag()) else {
        debug!(pos = %log.pos, code = %log.code, "log carries no group tag");
        return log.pos;
    };

    let mut lowest = log.pos;
    while lowest.y > query.min_y() {
        let pos = lowest.below(1);
        if !is_matching_log(query, pos, tag) {
            break;
        }
        lowest = pos;
    }

    let base = lowest
        .horizontal_neighbors()
        .filter(|&pos| is_matching_log(query, pos, tag))
        .chain(std::iter::once(lowest))
        .min_by_key(|p| (p.z, p.x))
        .unwrap_or(lowest);

    debug!(log = %log.pos, %base, tag, "resolved tree base");
    base
}

/// Resolve the trunk owning a foliage block.
///
/// Scans downward from the leaf through a 5×5 window for a log whose tag matches
/// the leaf's stripped tag. `None` if the world bottom is reached first.
pub fn find_tree_base_from_leaf<W: World + ?Sized>(
    query: &WorldQuery<'_, W>,
    leaf: &ProbedBlock,
) -> Option<BlockPos> {
    let Some(raw_tag) = leaf.tag() else {
        debug!(pos = %leaf.pos, code = %leaf.code, "leaf carries no group tag");
        return None;
    };
    let trunk_tag = strip_leaf_prefix(raw_tag);
    if trunk_tag.is_empty() {
        return None;
    }

    for y in (query.min_y()..=leaf.pos.y).rev() {
        let row = BlockPos::new(leaf.pos.x, y, leaf.pos.z);
        for dx in -LEAF_WINDOW..=LEAF_WINDOW {
            for dz in -LEAF_WINDOW..=LEAF_WINDOW {
                let pos = row.offset(dx, 0, dz);
                let Some(block) = query.probe(pos).filter(|b| b.kind.is_log()) else {
                    continue;
                };
                if block.tag().is_some_and(|t| tag_matches(t, trunk_tag)) {
                    return Some(find_tree_base(query, &block));
                }
            }
        }
    }

    debug!(pos = %leaf.pos, trunk_tag, "no trunk found below leaf");
    None
}

fn is_matching_log<W: World + ?Sized>(query: &WorldQuery<'_, W>, pos: BlockPos, tag: &str) -> bool {
    query
        .probe(pos)
        .filter(|b| b.kind.is_log())
        .and_then(|b| b.tag().map(|t| tag_matches(t, tag)))
        .unwrap_or(false)
}
