//! World access boundary
//!
//! The engine never owns block storage. Hosts implement [`World`]; the engine
//! re-reads blocks through it on every decision and never caches a block between
//! calls. [`WorldQuery`] wraps a world with the block classifier so the tree and
//! soil logic only sees structured [`ProbedBlock`]s.

use crate::core_types::block::{BlockClassifier, BlockCode, BlockKind};
use crate::core_types::position::BlockPos;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Named attributes the engine reads from a block type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAttributes {
    /// Tree group tag (`treeFellingGroupCode` in host block data)
    pub group_tag: Option<String>,
    /// Trunk growth order (`treeFellingGroupSpreadIndex` in host block data)
    pub spread_index: Option<i32>,
}

impl BlockAttributes {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            group_tag: Some(tag.into()),
            spread_index: None,
        }
    }

    pub fn with_spread_index(mut self, index: i32) -> Self {
        self.spread_index = Some(index);
        self
    }

    /// Group tag, treating an empty string as absent
    pub fn group_tag(&self) -> Option<&str> {
        self.group_tag.as_deref().filter(|t| !t.is_empty())
    }

    pub fn spread_index(&self) -> Option<i32> {
        self.spread_index
    }
}

/// A block as read from the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub code: BlockCode,
    pub attributes: BlockAttributes,
}

impl BlockState {
    pub fn new(code: impl Into<BlockCode>, attributes: BlockAttributes) -> Self {
        Self {
            code: code.into(),
            attributes,
        }
    }
}

/// Capability surface a host exposes to the engine
pub trait World {
    /// Block at `pos`; `None` for air or unloaded chunks
    fn block(&self, pos: BlockPos) -> Option<BlockState>;

    /// Replace the block at `pos`. Returns `false` if the host rejected the write
    /// (e.g. unknown block type).
    fn set_block(&mut self, pos: BlockPos, code: &BlockCode) -> bool;

    /// Destroy the block at `pos`, leaving air
    fn break_block(&mut self, pos: BlockPos);

    /// Whether the host knows a block type with this identifier
    fn has_block_type(&self, code: &BlockCode) -> bool;
}

impl<W: World + ?Sized> World for &mut W {
    fn block(&self, pos: BlockPos) -> Option<BlockState> {
        (**self).block(pos)
    }

    fn set_block(&mut self, pos: BlockPos, code: &BlockCode) -> bool {
        (**self).set_block(pos, code)
    }

    fn break_block(&mut self, pos: BlockPos) {
        (**self).break_block(pos);
    }

    fn has_block_type(&self, code: &BlockCode) -> bool {
        (**self).has_block_type(code)
    }
}

/// A non-air block with its classification resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedBlock {
    pub pos: BlockPos,
    pub code: BlockCode,
    pub kind: BlockKind,
    pub attributes: BlockAttributes,
}

impl ProbedBlock {
    /// Tree group tag of a log or leaf.
    ///
    /// The attribute wins; otherwise the third code segment is used. Other block
    /// kinds never carry a tag.
    pub fn tag(&self) -> Option<&str> {
        if !(self.kind.is_log() || self.kind.is_leaves()) {
            return None;
        }
        self.attributes
            .group_tag()
            .or_else(|| self.code.group_segment())
    }

    /// Spread index of a segmented log (missing attribute reads as 0).
    ///
    /// `None` for anything that is not a segmented log, meaning "unbounded".
    pub fn spread_index(&self) -> Option<i32> {
        if self.kind.is_segmented_log() {
            Some(self.attributes.spread_index().unwrap_or(0))
        } else {
            None
        }
    }
}

/// Read-only, classifying view over a [`World`]
pub struct WorldQuery<'a, W: World + ?Sized> {
    world: &'a W,
    classifier: &'a BlockClassifier,
    min_y: i32,
}

impl<'a, W: World + ?Sized> WorldQuery<'a, W> {
    pub fn new(world: &'a W, classifier: &'a BlockClassifier, min_y: i32) -> Self {
        Self {
            world,
            classifier,
            min_y,
        }
    }

    pub fn classifier(&self) -> &BlockClassifier {
        self.classifier
    }

    /// Lowest y coordinate downward scans may visit
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn world(&self) -> &W {
        self.world
    }

    /// Classified block at `pos`; `None` for air
    pub fn probe(&self, pos: BlockPos) -> Option<ProbedBlock> {
        let state = self.world.block(pos)?;
        let kind = self.classifier.classify(&state.code);
        if kind.is_air() {
            return None;
        }
        Some(ProbedBlock {
            pos,
            code: state.code,
            kind,
            attributes: state.attributes,
        })
    }

    /// Classification of the block at `pos` (`Air` when empty)
    pub fn kind_at(&self, pos: BlockPos) -> BlockKind {
        self.probe(pos).map_or(BlockKind::Air, |b| b.kind)
    }

    pub fn is_fire(&self, pos: BlockPos) -> bool {
        self.kind_at(pos).is_fire()
    }
}

/// In-memory world used by tests and headless tools
///
/// Block types must be registered before `set_block` accepts them, mirroring a
/// host that only knows the types its content defines.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    blocks: FxHashMap<BlockPos, BlockState>,
    types: FxHashMap<BlockCode, BlockAttributes>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type with the attributes its blocks carry
    pub fn register_type(&mut self, code: impl Into<BlockCode>, attributes: BlockAttributes) {
        self.types.insert(code.into(), attributes);
    }

    /// Place a block, registering its type with no attributes if unknown
    pub fn place(&mut self, pos: BlockPos, code: impl Into<BlockCode>) {
        let code = code.into();
        let attributes = self.types.entry(code.clone()).or_default().clone();
        self.blocks.insert(pos, BlockState { code, attributes });
    }

    /// Place a block with per-position attributes
    pub fn place_with(
        &mut self,
        pos: BlockPos,
        code: impl Into<BlockCode>,
        attributes: BlockAttributes,
    ) {
        let code = code.into();
        self.types.entry(code.clone()).or_default();
        self.blocks.insert(pos, BlockState { code, attributes });
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<BlockState> {
        self.blocks.remove(&pos)
    }

    /// Full identifier of the block at `pos`
    pub fn code_at(&self, pos: BlockPos) -> Option<String> {
        self.blocks.get(&pos).map(|b| b.code.to_string())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl World for MemoryWorld {
    fn block(&self, pos: BlockPos) -> Option<BlockState> {
        self.blocks.get(&pos).cloned()
    }

    fn set_block(&mut self, pos: BlockPos, code: &BlockCode) -> bool {
        let Some(attributes) = self.types.get(code) else {
            return false;
        };
        let state = BlockState {
            code: code.clone(),
            attributes: attributes.clone(),
        };
        self.blocks.insert(pos, state);
        true
    }

    fn break_block(&mut self, pos: BlockPos) {
        self.blocks.remove(&pos);
    }

    fn has_block_type(&self, code: &BlockCode) -> bool {
        self.types.contains_key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_skips_air() {
        let mut world = MemoryWorld::new();
        world.place(BlockPos::new(0, 0, 0), "game:air");
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);

        assert!(query.probe(BlockPos::new(0, 0, 0)).is_none());
        assert!(query.probe(BlockPos::new(9, 9, 9)).is_none());
    }

    #[test]
    fn test_tag_prefers_attribute_over_code() {
        let mut world = MemoryWorld::new();
        let pos = BlockPos::new(0, 1, 0);
        world.place_with(pos, "game:log-grown-oak-ud", BlockAttributes::tagged("bigoak"));
        world.place(pos.above(1), "game:log-grown-birch-ud");
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);

        assert_eq!(query.probe(pos).unwrap().tag(), Some("bigoak"));
        assert_eq!(query.probe(pos.above(1)).unwrap().tag(), Some("birch"));
    }

    #[test]
    fn test_spread_index_only_for_segmented_logs() {
        let mut world = MemoryWorld::new();
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(0, 1, 0);
        let c = BlockPos::new(0, 2, 0);
        world.place_with(
            a,
            "game:logsection-grown-redwood-ud",
            BlockAttributes::tagged("redwood").with_spread_index(3),
        );
        world.place_with(b, "game:logsection-grown-redwood-ud", BlockAttributes::tagged("redwood"));
        world.place_with(
            c,
            "game:log-grown-oak-ud",
            BlockAttributes::tagged("oak").with_spread_index(5),
        );
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);

        assert_eq!(query.probe(a).unwrap().spread_index(), Some(3));
        assert_eq!(query.probe(b).unwrap().spread_index(), Some(0));
        assert_eq!(query.probe(c).unwrap().spread_index(), None);
    }

    #[test]
    fn test_set_block_requires_registered_type() {
        let mut world = MemoryWorld::new();
        let pos = BlockPos::new(1, 1, 1);

        assert!(!world.set_block(pos, &"game:soil-low-none".into()));
        world.register_type("game:soil-low-none", BlockAttributes::default());
        assert!(world.set_block(pos, &"game:soil-low-none".into()));
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-low-none"));

        world.break_block(pos);
        assert!(world.is_empty());
    }
}
