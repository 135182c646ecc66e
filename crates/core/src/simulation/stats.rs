//! Engine statistics and per-tick reports

use crate::simulation::burn::{BurnReport, BurnRole};
use crate::soil::ConversionOutcome;
use crate::tree::FellingOutcome;
use serde::Serialize;

/// Snapshot of the engine's registries plus running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineStats {
    pub burning_blocks: usize,
    /// Trees with at least one block still burning
    pub burning_trees: usize,
    pub pending_soil: usize,
    /// Trees inside their "active" window
    pub active_trees: usize,
    pub fire_associations: usize,
    /// Events buffered before readiness
    pub queued_events: usize,
    pub dropped_events: u64,

    pub trees_felled: u64,
    pub logs_destroyed: u64,
    pub leaves_destroyed: u64,
    pub other_destroyed: u64,
    pub burns_aborted: u64,
    pub soil_converted: u64,
    pub soil_upgraded: u64,

    /// Time passed to the most recent tick
    pub last_tick: f64,
}

/// Running totals, folded from event and tick outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Totals {
    pub trees_felled: u64,
    pub logs_destroyed: u64,
    pub leaves_destroyed: u64,
    pub other_destroyed: u64,
    pub burns_aborted: u64,
    pub soil_converted: u64,
    pub soil_upgraded: u64,
}

impl Totals {
    pub fn record_felling(&mut self, outcome: &FellingOutcome) {
        if outcome.is_felled() {
            self.trees_felled += 1;
        }
    }

    pub fn record_soil(&mut self, outcome: &ConversionOutcome) {
        match outcome {
            ConversionOutcome::Converted { .. } => self.soil_converted += 1,
            ConversionOutcome::Upgraded { .. } => {
                self.soil_converted += 1;
                self.soil_upgraded += 1;
            }
            _ => {}
        }
    }

    pub fn record_burn(&mut self, report: &BurnReport) {
        self.logs_destroyed += report.destroyed(BurnRole::Log) as u64;
        self.leaves_destroyed += report.destroyed(BurnRole::Leaves) as u64;
        self.other_destroyed += report.destroyed(BurnRole::Other) as u64;
        self.burns_aborted += report.aborted() as u64;
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub now: f64,
    /// Delayed felling attempts made this tick
    pub fellings: Vec<FellingOutcome>,
    pub burn: BurnReport,
    /// Pending soil resolved by timeout or fire removal
    pub soil: Vec<ConversionOutcome>,
}

impl TickReport {
    pub fn new(now: f64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Whether the tick changed anything
    pub fn is_idle(&self) -> bool {
        self.fellings.is_empty() && self.burn.outcomes.is_empty() && self.soil.is_empty()
    }

    pub fn trees_felled(&self) -> usize {
        self.fellings.iter().filter(|f| f.is_felled()).count()
    }

    pub fn soil_converted(&self) -> usize {
        self.soil.iter().filter(|s| s.is_converted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::fertility::FertilityTier;
    use crate::core_types::position::BlockPos;
    use crate::simulation::burn::BurnOutcome;

    #[test]
    fn test_totals_fold_outcomes() {
        let mut totals = Totals::default();
        totals.record_soil(&ConversionOutcome::Converted {
            from: "game:soil-low-normal".into(),
            to: "game:soil-low-none".into(),
        });
        totals.record_soil(&ConversionOutcome::Upgraded {
            from: "game:soil-low-normal".into(),
            to: "game:soil-medium-none".into(),
            tier: FertilityTier::Medium,
        });
        totals.record_soil(&ConversionOutcome::NotSoil);
        assert_eq!(totals.soil_converted, 2);
        assert_eq!(totals.soil_upgraded, 1);

        let pos = BlockPos::new(0, 0, 0);
        totals.record_burn(&BurnReport {
            outcomes: vec![
                BurnOutcome::Destroyed {
                    pos,
                    role: BurnRole::Log,
                },
                BurnOutcome::Destroyed {
                    pos: pos.above(1),
                    role: BurnRole::Leaves,
                },
                BurnOutcome::Aborted { pos: pos.above(2) },
            ],
            burned_out: Vec::new(),
        });
        assert_eq!(totals.logs_destroyed, 1);
        assert_eq!(totals.leaves_destroyed, 1);
        assert_eq!(totals.burns_aborted, 1);
    }

    #[test]
    fn test_empty_report_is_idle() {
        let report = TickReport::new(3.0);
        assert!(report.is_idle());
        assert_eq!(report.trees_felled(), 0);
    }
}
