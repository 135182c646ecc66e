//! Felling controller
//!
//! Owns everything that decides *whether* a tree may be felled right now:
//! per-tree cooldowns and "active" flags, the per-tag base cache that dedups
//! repeated triggers against one physical tree, and the fire → log
//! associations created at ignition.

use crate::core_types::position::BlockPos;
use crate::core_types::tag::TreeIdentity;
use crate::simulation::timers::DeferredTimers;
use crate::tree::search::{find_tree, SearchLimits, TreeScan};
use crate::world::{World, WorldQuery};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Cooldown bookkeeping for one tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FellingCooldownState {
    /// Simulation time of the last successful felling
    pub last_felled: f64,
    /// Set while the tree is being felled; cleared by a deferred timer
    pub active: bool,
}

/// Fire position → resolved tree base, waiting for a felling attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireAssociation {
    pub log: BlockPos,
    pub created_at: f64,
}

/// Why a felling attempt did or did not happen
#[derive(Debug, Clone, PartialEq)]
pub enum FellingOutcome {
    /// No association exists for the fire (cancelled or already consumed)
    NoAssociation,
    /// The associated position no longer holds a log
    NotALog(BlockPos),
    /// The log carries no group tag
    MissingTag(BlockPos),
    /// The tree's base matches the last felled base for its tag
    DuplicateBase(TreeIdentity),
    /// The tree is active or still inside its cooldown window
    CoolingDown(TreeIdentity),
    /// The search found no tree blocks
    EmptyTree(TreeIdentity),
    /// Every tree block was already registered for burning
    NothingNew(TreeIdentity),
    Felled {
        tree: TreeIdentity,
        logs: usize,
        leaves: usize,
        /// Blocks newly registered for burning
        registered: usize,
    },
}

impl FellingOutcome {
    pub fn is_felled(&self) -> bool {
        matches!(self, FellingOutcome::Felled { .. })
    }
}

#[derive(Debug)]
pub struct FellingController {
    cooldown_seconds: f64,
    cooldowns: FxHashMap<TreeIdentity, FellingCooldownState>,
    last_base: FxHashMap<String, BlockPos>,
    associations: FxHashMap<BlockPos, FireAssociation>,
    release_timers: DeferredTimers<TreeIdentity>,
}

impl FellingController {
    pub fn new(cooldown_seconds: f64) -> Self {
        Self {
            cooldown_seconds,
            cooldowns: FxHashMap::default(),
            last_base: FxHashMap::default(),
            associations: FxHashMap::default(),
            release_timers: DeferredTimers::new(),
        }
    }

    /// Whether `tree` may be felled at `now`
    pub fn can_fell(&self, tree: &TreeIdentity, now: f64) -> bool {
        if tree.tag.is_empty() {
            return false;
        }
        match self.cooldowns.get(tree) {
            Some(state) if state.active => {
                debug!(%tree, "tree is already being felled");
                false
            }
            Some(state) if now - state.last_felled < self.cooldown_seconds => {
                debug!(%tree, "tree felling blocked by cooldown");
                false
            }
            _ => true,
        }
    }

    /// Timestamp the tree, mark it active and schedule the flag's release
    pub fn mark_felled(&mut self, tree: &TreeIdentity, now: f64) {
        if tree.tag.is_empty() {
            return;
        }
        self.cooldowns.insert(
            tree.clone(),
            FellingCooldownState {
                last_felled: now,
                active: true,
            },
        );
        self.last_base.insert(tree.tag.clone(), tree.base);
        self.release_timers
            .schedule(now + self.cooldown_seconds, tree.clone());
    }

    pub fn cooldown(&self, tree: &TreeIdentity) -> Option<&FellingCooldownState> {
        self.cooldowns.get(tree)
    }

    /// Whether `tree`'s base is the last felled base for its tag
    pub fn is_duplicate_base(&self, tree: &TreeIdentity) -> bool {
        self.last_base.get(&tree.tag) == Some(&tree.base)
    }

    /// Drop the base cache entry once a felled tree has burned out
    pub fn forget_base(&mut self, tree: &TreeIdentity) {
        if self.is_duplicate_base(tree) {
            self.last_base.remove(&tree.tag);
        }
    }

    /// Fire deferred releases and drop cooldowns that can no longer block
    pub fn expire(&mut self, now: f64) {
        for tree in self.release_timers.pop_due(now) {
            if let Some(state) = self.cooldowns.get_mut(&tree) {
                state.active = false;
                debug!(%tree, "tree felling cooldown released");
            }
        }
        let window = self.cooldown_seconds;
        self.cooldowns
            .retain(|_, state| state.active || now - state.last_felled < window);
    }

    /// Record the tree a fire resolved to, replacing any earlier association
    pub fn associate(&mut self, fire: BlockPos, log: BlockPos, now: f64) {
        self.associations.insert(
            fire,
            FireAssociation {
                log,
                created_at: now,
            },
        );
    }

    /// Remove a fire's association; `true` if one existed
    pub fn cancel(&mut self, fire: BlockPos) -> bool {
        self.associations.remove(&fire).is_some()
    }

    pub fn association(&self, fire: BlockPos) -> Option<&FireAssociation> {
        self.associations.get(&fire)
    }

    /// Fires whose association is at least `delay` seconds old, in position order
    pub fn due_associations(&self, now: f64, delay: f64) -> Vec<BlockPos> {
        let mut due: Vec<BlockPos> = self
            .associations
            .iter()
            .filter(|(_, a)| now - a.created_at >= delay)
            .map(|(&fire, _)| fire)
            .collect();
        due.sort_unstable();
        due
    }

    /// Attempt to fell the tree associated with `fire`.
    ///
    /// The association is consumed whatever the outcome. `register` receives the
    /// scan and returns how many blocks it newly scheduled for burning; the tree
    /// is only marked felled if that count is non-zero.
    pub fn try_fell_tree<W, R>(
        &mut self,
        query: &WorldQuery<'_, W>,
        fire: BlockPos,
        now: f64,
        limits: &SearchLimits,
        register: R,
    ) -> FellingOutcome
    where
        W: World + ?Sized,
        R: FnOnce(&TreeIdentity, &TreeScan) -> usize,
    {
        let Some(association) = self.associations.remove(&fire) else {
            debug!(%fire, "no log association for fire");
            return FellingOutcome::NoAssociation;
        };
        let log = association.log;

        let Some(block) = query.probe(log).filter(|b| b.kind.is_log()) else {
            debug!(%fire, %log, "associated block is no longer a log");
            return FellingOutcome::NotALog(log);
        };
        let Some(tag) = block.tag() else {
            debug!(%fire, %log, "associated log has no tree tag");
            return FellingOutcome::MissingTag(log);
        };
        let tree = TreeIdentity::new(tag, log);

        if self.is_duplicate_base(&tree) {
            debug!(%tree, "tree base already felled");
            return FellingOutcome::DuplicateBase(tree);
        }
        if !self.can_fell(&tree, now) {
            return FellingOutcome::CoolingDown(tree);
        }

        let scan = find_tree(query, log, limits);
        if scan.is_empty() {
            debug!(%tree, "no tree blocks found");
            return FellingOutcome::EmptyTree(tree);
        }

        let registered = register(&tree, &scan);
        if registered == 0 {
            debug!(%tree, "no new tree blocks to burn");
            return FellingOutcome::NothingNew(tree);
        }

        self.mark_felled(&tree, now);
        info!(
            %tree,
            logs = scan.logs.len(),
            leaves = scan.leaves.len(),
            registered,
            "tree queued for burning"
        );
        FellingOutcome::Felled {
            tree,
            logs: scan.logs.len(),
            leaves: scan.leaves.len(),
            registered,
        }
    }

    pub fn active_trees(&self) -> usize {
        self.cooldowns.values().filter(|s| s.active).count()
    }

    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Drop every volatile registry
    pub fn reset(&mut self) {
        self.cooldowns.clear();
        self.last_base.clear();
        self.associations.clear();
        self.release_timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::block::BlockClassifier;
    use crate::world::{BlockAttributes, MemoryWorld};

    fn oak_tree(world: &mut MemoryWorld, base: BlockPos) {
        for dy in 0..3 {
            world.place_with(base.above(dy), "game:log-grown-oak-ud", BlockAttributes::tagged("oak"));
        }
        world.place_with(base.offset(1, 2, 0), "game:leaves-grown-oak", BlockAttributes::tagged("6oak"));
    }

    #[test]
    fn test_cooldown_window() {
        let mut controller = FellingController::new(15.0);
        let tree = TreeIdentity::new("oak", BlockPos::new(0, 0, 0));

        assert!(controller.can_fell(&tree, 0.0));
        controller.mark_felled(&tree, 10.0);
        assert!(!controller.can_fell(&tree, 12.0));

        // Active flag holds until the release timer fires
        controller.expire(24.0);
        assert!(controller.cooldown(&tree).unwrap().active);
        controller.expire(25.0);
        assert!(controller.can_fell(&tree, 25.0));
        assert!(controller.cooldown(&tree).is_none());
    }

    #[test]
    fn test_empty_tag_never_fells() {
        let controller = FellingController::new(15.0);
        assert!(!controller.can_fell(&TreeIdentity::new("", BlockPos::new(0, 0, 0)), 0.0));
    }

    #[test]
    fn test_fell_then_duplicate() {
        let mut world = MemoryWorld::new();
        let base = BlockPos::new(0, 5, 0);
        oak_tree(&mut world, base);
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let limits = SearchLimits::default();
        let mut controller = FellingController::new(15.0);

        controller.associate(base.above(3), base, 0.0);
        let first = controller.try_fell_tree(&query, base.above(3), 0.0, &limits, |_, scan| {
            scan.block_count()
        });
        assert_eq!(
            first,
            FellingOutcome::Felled {
                tree: TreeIdentity::new("oak", base),
                logs: 3,
                leaves: 1,
                registered: 4,
            }
        );
        assert_eq!(controller.association_count(), 0);

        controller.associate(base.offset(1, 0, 0), base, 2.0);
        let second = controller.try_fell_tree(&query, base.offset(1, 0, 0), 2.0, &limits, |_, _| {
            panic!("duplicate tree must not be scanned")
        });
        assert!(matches!(second, FellingOutcome::DuplicateBase(_)));
        assert_eq!(controller.association(base.offset(1, 0, 0)), None);
    }

    #[test]
    fn test_cooldown_blocks_after_base_forgotten() {
        let mut world = MemoryWorld::new();
        let base = BlockPos::new(0, 5, 0);
        oak_tree(&mut world, base);
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let limits = SearchLimits::default();
        let mut controller = FellingController::new(15.0);
        let tree = TreeIdentity::new("oak", base);

        controller.mark_felled(&tree, 0.0);
        controller.forget_base(&tree);
        controller.associate(base.above(3), base, 1.0);
        let outcome = controller.try_fell_tree(&query, base.above(3), 1.0, &limits, |_, s| s.block_count());
        assert_eq!(outcome, FellingOutcome::CoolingDown(tree));
    }

    #[test]
    fn test_nothing_new_does_not_mark() {
        let mut world = MemoryWorld::new();
        let base = BlockPos::new(0, 5, 0);
        oak_tree(&mut world, base);
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let mut controller = FellingController::new(15.0);

        controller.associate(base.above(3), base, 0.0);
        let outcome =
            controller.try_fell_tree(&query, base.above(3), 0.0, &SearchLimits::default(), |_, _| 0);
        assert!(matches!(outcome, FellingOutcome::NothingNew(_)));
        assert_eq!(controller.active_trees(), 0);
    }

    #[test]
    fn test_missing_log_and_association() {
        let world = MemoryWorld::new();
        let classifier = BlockClassifier::default();
        let query = WorldQuery::new(&world, &classifier, 0);
        let mut controller = FellingController::new(15.0);
        let fire = BlockPos::new(0, 1, 0);

        let limits = SearchLimits::default();
        assert_eq!(
            controller.try_fell_tree(&query, fire, 0.0, &limits, |_, _| 1),
            FellingOutcome::NoAssociation
        );

        controller.associate(fire, BlockPos::new(0, 0, 0), 0.0);
        assert!(controller.cancel(fire));
        assert!(!controller.cancel(fire));

        controller.associate(fire, BlockPos::new(0, 0, 0), 0.0);
        assert_eq!(
            controller.try_fell_tree(&query, fire, 0.0, &limits, |_, _| 1),
            FellingOutcome::NotALog(BlockPos::new(0, 0, 0))
        );
        assert_eq!(controller.association_count(), 0);
    }

    #[test]
    fn test_due_associations_are_sorted() {
        let mut controller = FellingController::new(15.0);
        controller.associate(BlockPos::new(5, 0, 0), BlockPos::new(0, 0, 0), 0.0);
        controller.associate(BlockPos::new(1, 0, 0), BlockPos::new(0, 0, 0), 0.0);
        controller.associate(BlockPos::new(3, 0, 0), BlockPos::new(0, 0, 0), 4.0);

        assert_eq!(
            controller.due_associations(5.0, 5.0),
            vec![BlockPos::new(1, 0, 0), BlockPos::new(5, 0, 0)]
        );
        assert_eq!(controller.due_associations(9.0, 5.0).len(), 3);
    }
}
