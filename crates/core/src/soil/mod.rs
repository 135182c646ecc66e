//! Soil transformation beneath fires

pub mod conversion;
pub mod fertility;
pub mod pending;

pub use conversion::{try_convert_to_barren_soil, ConversionOutcome, BARE_COVERS};
pub use fertility::FertilityResolver;
pub use pending::{PendingSoilRecord, PendingSoilSnapshot, SoilPendingQueue, SNAPSHOT_VERSION};

use crate::config::EngineConfig;
use crate::core_types::block::{BlockClassifier, BlockKind};
use crate::core_types::position::BlockPos;
use crate::world::World;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

/// Owns the pending queue, the fertility resolver and its RNG
#[derive(Debug)]
pub struct SoilProcessor {
    queue: SoilPendingQueue,
    resolver: FertilityResolver,
    rng: StdRng,
    immediate: bool,
}

impl SoilProcessor {
    pub fn new(config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            queue: SoilPendingQueue::new(config.soil_timeout_seconds, config.soil_min_delay_seconds),
            resolver: FertilityResolver::from_config(config),
            rng,
            immediate: config.immediate_soil_conversion,
        }
    }

    pub fn queue(&self) -> &SoilPendingQueue {
        &self.queue
    }

    pub fn resolver(&self) -> &FertilityResolver {
        &self.resolver
    }

    /// Position of the soil a fire at `fire` would transform, if any.
    ///
    /// Looks directly below the fire; a tall-grass tuft there means the soil
    /// sits one further down.
    pub fn soil_target<W: World + ?Sized>(
        world: &W,
        classifier: &BlockClassifier,
        fire: BlockPos,
    ) -> Option<BlockPos> {
        let kind_at = |pos: BlockPos| {
            world
                .block(pos)
                .map_or(BlockKind::Air, |b| classifier.classify(&b.code))
        };

        let below = fire.below(1);
        match kind_at(below) {
            kind if classifier.is_soil_like(&kind) => Some(below),
            BlockKind::TallGrass => {
                let under_grass = fire.below(2);
                classifier
                    .is_soil_like(&kind_at(under_grass))
                    .then_some(under_grass)
            }
            _ => None,
        }
    }

    /// Inspect the ground under a new fire and queue it.
    ///
    /// In immediate mode the record is resolved at once and the outcome
    /// returned; otherwise it waits for [`SoilProcessor::sweep`] or
    /// [`SoilProcessor::resolve_for_fire`].
    pub fn queue_fire<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        classifier: &BlockClassifier,
        fire: BlockPos,
        now: f64,
    ) -> Option<ConversionOutcome> {
        let Some(target) = Self::soil_target(world, classifier, fire) else {
            debug!(%fire, "no soil below fire");
            return None;
        };
        let code = world.block(target)?.code;
        debug!(%fire, soil = %target, %code, "queued soil block");
        self.queue.insert(PendingSoilRecord {
            pos: target,
            code,
            queued_at: now,
            fire_pos: fire,
        });

        if !self.immediate {
            return None;
        }
        let record = self.queue.remove(target)?;
        Some(self.resolve_record(world, classifier, &record))
    }

    /// Force-resolve the record a removed fire left behind
    pub fn resolve_for_fire<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        classifier: &BlockClassifier,
        fire: BlockPos,
    ) -> Option<ConversionOutcome> {
        let Some(record) = self.queue.take_for_fire(fire) else {
            debug!(%fire, "no pending soil for removed fire");
            return None;
        };
        Some(self.resolve_record(world, classifier, &record))
    }

    /// Resolve every record whose timeout elapsed or whose fire went out
    pub fn sweep<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        classifier: &BlockClassifier,
        now: f64,
    ) -> Vec<ConversionOutcome> {
        let due = self.queue.take_due(now, |fire| {
            world
                .block(fire)
                .is_some_and(|b| classifier.classify(&b.code).is_fire())
        });
        due.iter()
            .map(|record| self.resolve_record(world, classifier, record))
            .collect()
    }

    fn resolve_record<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        classifier: &BlockClassifier,
        record: &PendingSoilRecord,
    ) -> ConversionOutcome {
        let current = world.block(record.pos).map(|b| b.code);
        if current.as_ref() != Some(&record.code) {
            debug!(
                pos = %record.pos,
                expected = %record.code,
                found = ?current.as_ref().map(ToString::to_string),
                "pending soil block changed"
            );
        }

        let resolver = &self.resolver;
        let rng = &mut self.rng;
        try_convert_to_barren_soil(world, classifier, record.pos, |tier| resolver.roll(tier, rng))
    }

    /// Replace the queue with a restored snapshot, dropping records that no
    /// longer sit on soil
    pub fn restore<W: World + ?Sized>(
        &mut self,
        world: &W,
        classifier: &BlockClassifier,
        snapshot: PendingSoilSnapshot,
    ) -> usize {
        let mut kept = snapshot;
        kept.records.retain(|record| {
            let soil = world
                .block(record.pos)
                .is_some_and(|b| classifier.is_soil_like(&classifier.classify(&b.code)));
            if !soil {
                warn!(pos = %record.pos, code = %record.code, "dropping restored record that is no longer soil");
            }
            soil
        });
        let count = kept.records.len();
        self.queue.restore(kept);
        count
    }

    pub fn snapshot(&self) -> PendingSoilSnapshot {
        self.queue.snapshot()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockAttributes, MemoryWorld};

    fn config(immediate: bool) -> EngineConfig {
        EngineConfig {
            immediate_soil_conversion: immediate,
            seed: Some(7),
            ..EngineConfig::default()
        }
    }

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        for tier in ["verylow", "low", "medium", "compost", "high"] {
            world.register_type(format!("game:soil-{tier}-none"), BlockAttributes::default());
        }
        world.register_type("game:fire", BlockAttributes::default());
        world
    }

    #[test]
    fn test_tall_grass_targets_soil_two_below() {
        let mut world = world();
        world.place(BlockPos::new(2, 19, 2), "game:tallgrass-tall-free");
        world.place(BlockPos::new(2, 18, 2), "game:soil-low-normal");
        let classifier = BlockClassifier::default();

        assert_eq!(
            SoilProcessor::soil_target(&world, &classifier, BlockPos::new(2, 20, 2)),
            Some(BlockPos::new(2, 18, 2))
        );
    }

    #[test]
    fn test_immediate_mode_converts_and_leaves_queue_empty() {
        let mut world = world();
        let fire = BlockPos::new(5, 10, 5);
        world.place(fire.below(1), "game:soil-low-normal");
        let classifier = BlockClassifier::default();
        let mut soil = SoilProcessor::new(&config(true));

        let outcome = soil.queue_fire(&mut world, &classifier, fire, 0.0).unwrap();
        assert!(outcome.is_converted());
        assert!(soil.queue().is_empty());
        let code = world.code_at(fire.below(1)).unwrap();
        assert!(code.ends_with("-none"), "{code}");
    }

    #[test]
    fn test_delayed_mode_waits_for_fire_removal() {
        let mut world = world();
        let fire = BlockPos::new(0, 10, 0);
        world.place(fire, "game:fire");
        world.place(fire.below(1), "game:soil-medium-normal");
        let classifier = BlockClassifier::default();
        let mut soil = SoilProcessor::new(&config(false));

        assert!(soil.queue_fire(&mut world, &classifier, fire, 0.0).is_none());
        assert_eq!(soil.queue().len(), 1);

        // Fire still present, timeout not reached
        assert!(soil.sweep(&mut world, &classifier, 5.0).is_empty());

        world.remove(fire);
        let outcomes = soil.sweep(&mut world, &classifier, 6.0);
        assert_eq!(outcomes.len(), 1);
        assert!(soil.queue().is_empty());
    }

    #[test]
    fn test_forced_resolution_on_extinguish() {
        let mut world = world();
        let fire = BlockPos::new(0, 10, 0);
        world.place(fire.below(1), "game:soil-verylow-normal");
        let classifier = BlockClassifier::default();
        let mut soil = SoilProcessor::new(&config(false));

        soil.queue_fire(&mut world, &classifier, fire, 0.0);
        let outcome = soil.resolve_for_fire(&mut world, &classifier, fire).unwrap();
        assert!(outcome.is_converted());
        assert!(soil.queue().is_empty());
        assert!(soil.resolve_for_fire(&mut world, &classifier, fire).is_none());
    }

    #[test]
    fn test_restore_drops_non_soil_records() {
        let mut world = world();
        world.place(BlockPos::new(0, 0, 0), "game:soil-low-normal");
        world.place(BlockPos::new(1, 0, 0), "game:rock-granite");
        let classifier = BlockClassifier::default();
        let mut soil = SoilProcessor::new(&config(false));

        let snapshot = PendingSoilSnapshot {
            version: SNAPSHOT_VERSION,
            records: [BlockPos::new(0, 0, 0), BlockPos::new(1, 0, 0)]
                .into_iter()
                .map(|pos| PendingSoilRecord {
                    pos,
                    code: "game:soil-low-normal".into(),
                    queued_at: 0.0,
                    fire_pos: pos.above(1),
                })
                .collect(),
        };
        assert_eq!(soil.restore(&world, &classifier, snapshot), 1);
        assert_eq!(soil.snapshot().records.len(), 1);
    }
}
