use burnscar_core::simulation::BurnRole;
use burnscar_core::{EngineStats, TickReport};

use crate::error::{BurnscarErrorCode, DefaultBurnscarError};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, with_engine_mut};
use crate::instance::BurnscarInstance;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// FFI-friendly snapshot of the engine's registries and running totals.
/// Keep this layout stable for C/C++/C# consumers.
pub struct BurnscarStats {
    /// Whether `burnscar_mark_ready` has been called.
    pub ready: bool,
    /// Blocks currently registered for burning.
    pub burning_blocks: u64,
    /// Trees with at least one block still burning.
    pub burning_trees: u64,
    /// Soil blocks waiting for conversion.
    pub pending_soil: u64,
    /// Trees inside their felling cooldown window.
    pub active_trees: u64,
    /// Fires waiting on a felling attempt.
    pub fire_associations: u64,
    /// Events buffered before readiness.
    pub queued_events: u64,
    /// Events lost to inbox overflow.
    pub dropped_events: u64,
    pub trees_felled: u64,
    pub logs_destroyed: u64,
    pub leaves_destroyed: u64,
    pub other_destroyed: u64,
    /// Burns dropped because the block changed before expiry.
    pub burns_aborted: u64,
    pub soil_converted: u64,
    pub soil_upgraded: u64,
    /// Time passed to the most recent tick (seconds).
    pub last_tick: f64,
}

impl BurnscarStats {
    fn from_engine(stats: &EngineStats, ready: bool) -> Self {
        Self {
            ready,
            burning_blocks: stats.burning_blocks as u64,
            burning_trees: stats.burning_trees as u64,
            pending_soil: stats.pending_soil as u64,
            active_trees: stats.active_trees as u64,
            fire_associations: stats.fire_associations as u64,
            queued_events: stats.queued_events as u64,
            dropped_events: stats.dropped_events,
            trees_felled: stats.trees_felled,
            logs_destroyed: stats.logs_destroyed,
            leaves_destroyed: stats.leaves_destroyed,
            other_destroyed: stats.other_destroyed,
            burns_aborted: stats.burns_aborted,
            soil_converted: stats.soil_converted,
            soil_upgraded: stats.soil_upgraded,
            last_tick: stats.last_tick,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// What a single `burnscar_tick` call did.
pub struct BurnscarTickSummary {
    /// Delayed fellings that registered a tree this tick.
    pub trees_felled: u32,
    pub logs_destroyed: u32,
    pub leaves_destroyed: u32,
    pub burns_aborted: u32,
    pub soil_converted: u32,
}

impl From<&TickReport> for BurnscarTickSummary {
    fn from(report: &TickReport) -> Self {
        Self {
            trees_felled: report.trees_felled() as u32,
            logs_destroyed: report.burn.destroyed(BurnRole::Log) as u32,
            leaves_destroyed: report.burn.destroyed(BurnRole::Leaves) as u32,
            burns_aborted: report.burn.aborted() as u32,
            soil_converted: report.soil_converted() as u32,
        }
    }
}

/// Copy the engine statistics into `out_stats`.
///
/// Returns
/// - `BurnscarErrorCode::Ok` (0) on success
/// - `BurnscarErrorCode::NullPointer` if `ptr` or `out_stats` is null
/// - `BurnscarErrorCode::LockPoisoned` if the engine lock is poisoned
///
/// # Safety
/// `out_stats` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn burnscar_get_stats(
    ptr: *const BurnscarInstance,
    out_stats: *mut BurnscarStats,
) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        if out_stats.is_null() {
            return Err(DefaultBurnscarError::null_pointer("out_stats"));
        }
        let stats = with_engine_mut(instance, |engine, _world| {
            BurnscarStats::from_engine(&engine.stats(), engine.is_ready())
        })?;
        // SAFETY: checked non-null above; writable per the contract.
        unsafe {
            *out_stats = stats;
        }
        Ok(())
    })
}
