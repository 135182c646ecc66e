//! Tick orchestrator
//!
//! `Engine` owns every registry (fire → log associations, cooldowns, burning
//! blocks, pending soil) and exposes the host-facing entry points:
//!
//! - [`Engine::on_ignite`] / [`Engine::on_extinguish`] run synchronously inside
//!   the host's fire placement/removal hooks
//! - [`Engine::tick`] runs once per fixed interval and expires burns and
//!   pending soil
//! - [`Engine::mark_ready`] flips the lifecycle from `Uninitialized` to `Ready`
//!   and replays events that arrived while the world was still loading
//!
//! The world is borrowed per call; the engine never stores it. Time is passed
//! in explicitly as monotonic seconds since world start.

use crate::config::EngineConfig;
use crate::core_types::block::BlockClassifier;
use crate::core_types::position::BlockPos;
use crate::error::{ConfigError, SnapshotError};
use crate::simulation::burn::{BurnDurations, BurnScheduler};
use crate::simulation::events::{EventInbox, HostEvent, HostEventKind};
use crate::simulation::stats::{EngineStats, TickReport, Totals};
use crate::soil::{ConversionOutcome, PendingSoilSnapshot, SoilProcessor};
use crate::tree::{find_nearby_log, FellingController, FellingOutcome, LocatedTree, SearchLimits};
use crate::world::{World, WorldQuery};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// World not loaded yet; host events are buffered
    Uninitialized,
    Ready,
}

/// Result of a fire placement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgniteReport {
    /// Buffered until the engine is ready
    pub deferred: bool,
    pub located: Option<LocatedTree>,
    /// Immediate felling attempt (`None` when delayed or no tree was found)
    pub felling: Option<FellingOutcome>,
    /// Immediate soil conversion (`None` when queued or no soil was found)
    pub soil: Option<ConversionOutcome>,
}

/// Result of a fire removal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtinguishReport {
    pub deferred: bool,
    /// A pending felling was cancelled
    pub cancelled_felling: bool,
    /// Forced resolution of the fire's pending soil
    pub soil: Option<ConversionOutcome>,
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    classifier: BlockClassifier,
    limits: SearchLimits,
    state: EngineState,
    inbox: EventInbox,
    felling: FellingController,
    burn: BurnScheduler,
    soil: SoilProcessor,
    totals: Totals,
    last_tick: f64,
}

impl Engine {
    /// Create an engine in the `Uninitialized` state
    ///
    /// # Errors
    /// Returns error if the config fails validation
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let limits = SearchLimits {
            horizontal_radius: config.leaf_search_radius,
            connectivity_depth: config.leaf_connectivity_depth,
        };
        Ok(Self {
            classifier: BlockClassifier::from_config(&config),
            limits,
            state: EngineState::Uninitialized,
            inbox: EventInbox::new(config.inbox_capacity),
            felling: FellingController::new(config.felling_cooldown_seconds),
            burn: BurnScheduler::new(BurnDurations::from_config(&config)),
            soil: SoilProcessor::new(&config),
            totals: Totals::default(),
            last_tick: 0.0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &BlockClassifier {
        &self.classifier
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    pub fn felling(&self) -> &FellingController {
        &self.felling
    }

    pub fn burn(&self) -> &BurnScheduler {
        &self.burn
    }

    pub fn soil(&self) -> &SoilProcessor {
        &self.soil
    }

    /// Transition to `Ready` and replay buffered events in arrival order.
    ///
    /// A buffered ignition is only replayed if the fire block is still there;
    /// otherwise it is handled as an extinguish so its association and pending
    /// soil do not linger. Returns the number of events replayed.
    pub fn mark_ready<W: World + ?Sized>(&mut self, world: &mut W, now: f64) -> usize {
        if self.is_ready() {
            return 0;
        }
        self.state = EngineState::Ready;
        let events = self.inbox.drain();
        let count = events.len();

        for event in events {
            match event.kind {
                HostEventKind::Ignite => {
                    let still_burning =
                        WorldQuery::new(&*world, &self.classifier, self.config.world_min_y)
                            .is_fire(event.pos);
                    if still_burning {
                        self.on_ignite(world, event.pos, now);
                    } else {
                        debug!(fire = %event.pos, "buffered fire is gone, skipping ignition");
                        self.on_extinguish(world, event.pos, now);
                    }
                }
                HostEventKind::Extinguish => {
                    self.on_extinguish(world, event.pos, now);
                }
            }
        }

        info!(replayed = count, dropped = self.inbox.dropped(), "engine ready");
        count
    }

    /// Handle a fire placed at `fire`.
    ///
    /// Locates the burning tree and associates the fire with its base; with no
    /// felling delay the tree is felled right away. Independently, the soil
    /// beneath the fire is queued (and converted at once in immediate mode).
    pub fn on_ignite<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        fire: BlockPos,
        now: f64,
    ) -> IgniteReport {
        if !self.is_ready() {
            self.inbox.push(HostEvent::ignite(fire, now));
            return IgniteReport {
                deferred: true,
                ..IgniteReport::default()
            };
        }

        let mut report = IgniteReport::default();
        {
            let query = WorldQuery::new(&*world, &self.classifier, self.config.world_min_y);
            report.located = find_nearby_log(&query, fire);

            if let Some(located) = report.located {
                self.felling.associate(fire, located.base, now);
                if self.config.felling_delay_seconds <= 0.0 {
                    let outcome = fell(
                        &mut self.felling,
                        &mut self.burn,
                        &query,
                        fire,
                        now,
                        &self.limits,
                    );
                    self.totals.record_felling(&outcome);
                    report.felling = Some(outcome);
                }
            } else {
                debug!(%fire, "no tree near fire");
            }
        }

        report.soil = self.soil.queue_fire(world, &self.classifier, fire, now);
        if let Some(outcome) = &report.soil {
            self.totals.record_soil(outcome);
        }
        report
    }

    /// Handle the fire at `fire` being removed.
    ///
    /// Cancels its pending felling and force-resolves its pending soil.
    pub fn on_extinguish<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        fire: BlockPos,
        now: f64,
    ) -> ExtinguishReport {
        if !self.is_ready() {
            self.inbox.push(HostEvent::extinguish(fire, now));
            return ExtinguishReport {
                deferred: true,
                ..ExtinguishReport::default()
            };
        }

        let cancelled_felling = self.felling.cancel(fire);
        if cancelled_felling {
            debug!(%fire, "cancelled pending felling");
        }
        let soil = self.soil.resolve_for_fire(world, &self.classifier, fire);
        if let Some(outcome) = &soil {
            self.totals.record_soil(outcome);
        }
        ExtinguishReport {
            deferred: false,
            cancelled_felling,
            soil,
        }
    }

    /// Advance every time-driven registry to `now`.
    ///
    /// Order: cooldown releases, delayed fellings, burn expiry, pending soil.
    /// Does nothing before the engine is ready.
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W, now: f64) -> TickReport {
        let mut report = TickReport::new(now);
        if !self.is_ready() {
            debug!(queued = self.inbox.len(), "tick before engine ready");
            return report;
        }
        self.last_tick = now;

        self.felling.expire(now);

        {
            let query = WorldQuery::new(&*world, &self.classifier, self.config.world_min_y);
            for fire in self
                .felling
                .due_associations(now, self.config.felling_delay_seconds)
            {
                let outcome = fell(
                    &mut self.felling,
                    &mut self.burn,
                    &query,
                    fire,
                    now,
                    &self.limits,
                );
                self.totals.record_felling(&outcome);
                report.fellings.push(outcome);
            }
        }

        report.burn = self.burn.advance(world, now);
        for tree in &report.burn.burned_out {
            debug!(%tree, "tree burned out");
            self.felling.forget_base(tree);
        }
        self.totals.record_burn(&report.burn);

        report.soil = self.soil.sweep(world, &self.classifier, now);
        for outcome in &report.soil {
            self.totals.record_soil(outcome);
        }

        if !report.is_idle() {
            info!(
                now,
                felled = report.trees_felled(),
                destroyed = report.burn.outcomes.len() - report.burn.aborted(),
                aborted = report.burn.aborted(),
                soil_converted = report.soil_converted(),
                "tick"
            );
        }
        report
    }

    /// Serializable copy of the pending soil queue
    pub fn save_pending(&self) -> PendingSoilSnapshot {
        self.soil.snapshot()
    }

    /// Encode the pending soil queue as JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn save_pending_json(&self) -> Result<String, SnapshotError> {
        self.save_pending().to_json()
    }

    /// Restore the pending soil queue after a world load.
    ///
    /// Every volatile registry (burning blocks, cooldowns, base cache,
    /// associations) is reset. Returns the number of records kept.
    pub fn load_pending<W: World + ?Sized>(
        &mut self,
        world: &W,
        snapshot: PendingSoilSnapshot,
    ) -> usize {
        self.felling.reset();
        self.burn.clear();
        let restored = self.soil.restore(world, &self.classifier, snapshot);
        info!(restored, "restored pending soil");
        restored
    }

    /// Restore the pending soil queue from JSON
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be parsed or has the wrong version
    pub fn load_pending_json<W: World + ?Sized>(
        &mut self,
        world: &W,
        json: &str,
    ) -> Result<usize, SnapshotError> {
        let snapshot = PendingSoilSnapshot::from_json(json)?;
        Ok(self.load_pending(world, snapshot))
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            burning_blocks: self.burn.len(),
            burning_trees: self.burn.burning_trees(),
            pending_soil: self.soil.queue().len(),
            active_trees: self.felling.active_trees(),
            fire_associations: self.felling.association_count(),
            queued_events: self.inbox.len(),
            dropped_events: self.inbox.dropped(),
            trees_felled: self.totals.trees_felled,
            logs_destroyed: self.totals.logs_destroyed,
            leaves_destroyed: self.totals.leaves_destroyed,
            other_destroyed: self.totals.other_destroyed,
            burns_aborted: self.totals.burns_aborted,
            soil_converted: self.totals.soil_converted,
            soil_upgraded: self.totals.soil_upgraded,
            last_tick: self.last_tick,
        }
    }
}

/// One felling attempt, registering the scanned tree with the burn scheduler
fn fell<W: World + ?Sized>(
    felling: &mut FellingController,
    burn: &mut BurnScheduler,
    query: &WorldQuery<'_, W>,
    fire: BlockPos,
    now: f64,
    limits: &SearchLimits,
) -> FellingOutcome {
    felling.try_fell_tree(query, fire, now, limits, |tree, scan| {
        burn.register_scan(query, tree, scan, now)
    })
}

/// Engine handle shared between the host's event and tick contexts.
///
/// Every entry point locks the same mutex, so registry invariants hold even
/// when the host delivers events from another thread.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine. A poisoned lock is recovered; engine state is only
    /// mutated through methods that leave it consistent between calls.
    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with the engine locked
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn on_ignite<W: World + ?Sized>(&self, world: &mut W, fire: BlockPos, now: f64) -> IgniteReport {
        self.lock().on_ignite(world, fire, now)
    }

    pub fn on_extinguish<W: World + ?Sized>(
        &self,
        world: &mut W,
        fire: BlockPos,
        now: f64,
    ) -> ExtinguishReport {
        self.lock().on_extinguish(world, fire, now)
    }

    pub fn tick<W: World + ?Sized>(&self, world: &mut W, now: f64) -> TickReport {
        self.lock().tick(world, now)
    }

    pub fn stats(&self) -> EngineStats {
        self.lock().stats()
    }
}
