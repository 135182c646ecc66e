//! Burn scheduler
//!
//! Registry of blocks alight after a tree has been felled. Each record moves
//! from queued to expired once its duration has elapsed, and is then either
//! destroyed (the live block still matches what was ignited) or aborted
//! (someone changed the block meanwhile). Inserts are idempotent per position.
//!
//! Destroyed `(position, ignition time)` pairs are kept as tombstones for the
//! longest burn duration so a stale scan can never re-ignite them.

use crate::config::EngineConfig;
use crate::core_types::block::{BlockCode, BlockKind};
use crate::core_types::position::BlockPos;
use crate::core_types::tag::TreeIdentity;
use crate::tree::search::TreeScan;
use crate::world::{World, WorldQuery};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What kind of block is burning, deciding its duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurnRole {
    Log,
    Leaves,
    Other,
}

impl BurnRole {
    pub fn from_kind(kind: &BlockKind) -> Self {
        match kind {
            BlockKind::Log { .. } => BurnRole::Log,
            BlockKind::Leaves => BurnRole::Leaves,
            _ => BurnRole::Other,
        }
    }
}

/// Burn durations per role, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnDurations {
    pub log: f64,
    pub leaves: f64,
    pub fallback: f64,
}

impl BurnDurations {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            log: config.log_burn_duration,
            leaves: config.leaf_burn_duration,
            fallback: config.fallback_burn_duration,
        }
    }

    pub fn for_role(&self, role: BurnRole) -> f64 {
        match role {
            BurnRole::Log => self.log,
            BurnRole::Leaves => self.leaves,
            BurnRole::Other => self.fallback,
        }
    }

    pub fn max(&self) -> f64 {
        self.log.max(self.leaves).max(self.fallback)
    }
}

impl Default for BurnDurations {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// A block scheduled for destruction
#[derive(Debug, Clone, PartialEq)]
pub struct BurningBlockRecord {
    pub pos: BlockPos,
    /// Identifier at ignition; destruction is skipped if it changed
    pub code: BlockCode,
    pub ignited_at: f64,
    pub duration: f64,
    /// Canopy steps from the trunk (0 for logs)
    pub canopy_distance: u32,
    pub role: BurnRole,
    /// Tree the block was registered for
    pub tree: Option<TreeIdentity>,
}

impl BurningBlockRecord {
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.ignited_at >= self.duration
    }
}

/// Terminal state of an expired record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnOutcome {
    /// World write issued
    Destroyed { pos: BlockPos, role: BurnRole },
    /// Live block no longer matched; record dropped without a write
    Aborted { pos: BlockPos },
}

/// Everything one [`BurnScheduler::advance`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BurnReport {
    pub outcomes: Vec<BurnOutcome>,
    /// Trees whose last burning block just expired
    pub burned_out: Vec<TreeIdentity>,
}

impl BurnReport {
    pub fn destroyed(&self, role: BurnRole) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BurnOutcome::Destroyed { role: r, .. } if *r == role))
            .count()
    }

    pub fn aborted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BurnOutcome::Aborted { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
struct Tombstone {
    ignited_at: f64,
    expired_at: f64,
}

#[derive(Debug)]
pub struct BurnScheduler {
    durations: BurnDurations,
    records: FxHashMap<BlockPos, BurningBlockRecord>,
    tombstones: FxHashMap<BlockPos, Tombstone>,
    per_tree: FxHashMap<TreeIdentity, usize>,
}

impl BurnScheduler {
    pub fn new(durations: BurnDurations) -> Self {
        Self {
            durations,
            records: FxHashMap::default(),
            tombstones: FxHashMap::default(),
            per_tree: FxHashMap::default(),
        }
    }

    pub fn durations(&self) -> &BurnDurations {
        &self.durations
    }

    /// Register a block for burning. Returns `false` if the position is already
    /// burning or this exact ignition was already destroyed.
    pub fn ignite(&mut self, record: BurningBlockRecord) -> bool {
        if self.records.contains_key(&record.pos) {
            return false;
        }
        if self
            .tombstones
            .get(&record.pos)
            .is_some_and(|t| t.ignited_at.total_cmp(&record.ignited_at).is_eq())
        {
            debug!(pos = %record.pos, "ignoring re-ignition of destroyed block");
            return false;
        }
        if let Some(tree) = &record.tree {
            *self.per_tree.entry(tree.clone()).or_insert(0) += 1;
        }
        self.records.insert(record.pos, record);
        true
    }

    /// Register every block of a scanned tree. Returns how many were new.
    pub fn register_scan<W: World + ?Sized>(
        &mut self,
        query: &WorldQuery<'_, W>,
        tree: &TreeIdentity,
        scan: &TreeScan,
        now: f64,
    ) -> usize {
        let blocks = scan
            .logs
            .iter()
            .map(|&pos| (pos, 0))
            .chain(scan.leaves.iter().map(|leaf| (leaf.pos, leaf.distance)));

        let mut added = 0;
        for (pos, canopy_distance) in blocks {
            if self.records.contains_key(&pos) {
                continue;
            }
            let Some(block) = query.probe(pos) else {
                continue;
            };
            let role = BurnRole::from_kind(&block.kind);
            let record = BurningBlockRecord {
                pos,
                code: block.code,
                ignited_at: now,
                duration: self.durations.for_role(role),
                canopy_distance,
                role,
                tree: Some(tree.clone()),
            };
            if self.ignite(record) {
                added += 1;
            }
        }
        added
    }

    /// Destroy or abort every expired record.
    ///
    /// Expired records are handled outermost canopy first, then by position, so
    /// the order of world writes is deterministic.
    pub fn advance<W: World + ?Sized>(&mut self, world: &mut W, now: f64) -> BurnReport {
        let mut expired: Vec<BurningBlockRecord> = self
            .records
            .values()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by(|a, b| {
            b.canopy_distance
                .cmp(&a.canopy_distance)
                .then(a.pos.cmp(&b.pos))
        });

        let mut report = BurnReport::default();
        for record in expired {
            self.records.remove(&record.pos);
            self.tombstones.insert(
                record.pos,
                Tombstone {
                    ignited_at: record.ignited_at,
                    expired_at: now,
                },
            );

            let live = world.block(record.pos).map(|b| b.code);
            let outcome = if live.as_ref() == Some(&record.code) {
                world.break_block(record.pos);
                debug!(pos = %record.pos, code = %record.code, "burnt block destroyed");
                BurnOutcome::Destroyed {
                    pos: record.pos,
                    role: record.role,
                }
            } else {
                debug!(pos = %record.pos, expected = %record.code, "burning block changed, aborting");
                BurnOutcome::Aborted { pos: record.pos }
            };
            report.outcomes.push(outcome);

            if let Some(tree) = record.tree {
                if self.release_tree_block(&tree) {
                    report.burned_out.push(tree);
                }
            }
        }

        let leaves = report.destroyed(BurnRole::Leaves);
        let logs = report.destroyed(BurnRole::Log);
        if leaves > 0 {
            info!(count = leaves, "leaf destruction event: {leaves} blocks destroyed");
        }
        if logs > 0 {
            info!(count = logs, "tree felling event: {logs} log blocks destroyed");
        }

        let window = self.durations.max();
        self.tombstones.retain(|_, t| now - t.expired_at <= window);
        report
    }

    /// Decrement a tree's live count; `true` when it reaches zero
    fn release_tree_block(&mut self, tree: &TreeIdentity) -> bool {
        let Some(count) = self.per_tree.get_mut(tree) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.per_tree.remove(tree);
            return true;
        }
        false
    }

    pub fn get(&self, pos: BlockPos) -> Option<&BurningBlockRecord> {
        self.records.get(&pos)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.records.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of trees with blocks still burning
    pub fn burning_trees(&self) -> usize {
        self.per_tree.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.tombstones.clear();
        self.per_tree.clear();
    }
}
