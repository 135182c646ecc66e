use burnscar_core::BlockPos;

use crate::error::{BurnscarErrorCode, DefaultBurnscarError};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, with_engine_mut};
use crate::instance::BurnscarInstance;
use crate::queries::BurnscarTickSummary;

fn checked_time(now: f64) -> Result<f64, DefaultBurnscarError> {
    if now.is_finite() {
        Ok(now)
    } else {
        Err(DefaultBurnscarError::invalid_parameter(format!(
            "Parameter 'now' must be finite, got {now}"
        )))
    }
}

/// Mark the world as loaded and replay fire events buffered before now.
///
/// Events received while uninitialized are replayed in arrival order; a
/// buffered ignition whose fire block has since disappeared is treated as an
/// extinguish. Calling this again is a no-op.
///
/// Returns
/// - `BurnscarErrorCode::Ok` (0) on success
/// - `BurnscarErrorCode::NullPointer` if `ptr` is null
/// - `BurnscarErrorCode::InvalidParameter` if `now` is not finite
/// - `BurnscarErrorCode::LockPoisoned` if the engine lock is poisoned
#[no_mangle]
pub extern "C" fn burnscar_mark_ready(ptr: *const BurnscarInstance, now: f64) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let now = checked_time(now)?;
        with_engine_mut(instance, |engine, world| {
            engine.mark_ready(world, now);
        })
    })
}

/// Report a fire block placed at (x, y, z).
///
/// Runs synchronously: locates the burning tree, fells it if allowed and
/// converts or queues the soil under the fire. Before `burnscar_mark_ready`
/// the event is only buffered.
///
/// Returns the same codes as `burnscar_mark_ready`.
#[no_mangle]
pub extern "C" fn burnscar_on_ignite(
    ptr: *const BurnscarInstance,
    x: i32,
    y: i32,
    z: i32,
    now: f64,
) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let now = checked_time(now)?;
        with_engine_mut(instance, |engine, world| {
            engine.on_ignite(world, BlockPos::new(x, y, z), now);
        })
    })
}

/// Report the fire block at (x, y, z) removed.
///
/// Cancels a felling still waiting on this fire and converts its pending
/// soil immediately.
///
/// Returns the same codes as `burnscar_mark_ready`.
#[no_mangle]
pub extern "C" fn burnscar_on_extinguish(
    ptr: *const BurnscarInstance,
    x: i32,
    y: i32,
    z: i32,
    now: f64,
) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let now = checked_time(now)?;
        with_engine_mut(instance, |engine, world| {
            engine.on_extinguish(world, BlockPos::new(x, y, z), now);
        })
    })
}

/// Advance the engine to `now` (seconds since world start).
///
/// Expires burning blocks and pending soil, and runs delayed fellings. Call at
/// a fixed rate from the server loop.
///
/// `out_summary` may be null; otherwise it receives what this tick did.
///
/// Returns the same codes as `burnscar_mark_ready`.
///
/// # Safety
/// `out_summary` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn burnscar_tick(
    ptr: *const BurnscarInstance,
    now: f64,
    out_summary: *mut BurnscarTickSummary,
) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let now = checked_time(now)?;
        let summary = with_engine_mut(instance, |engine, world| {
            BurnscarTickSummary::from(&engine.tick(world, now))
        })?;
        if !out_summary.is_null() {
            // SAFETY: non-null and writable per the contract above.
            unsafe {
                *out_summary = summary;
            }
        }
        Ok(())
    })
}
