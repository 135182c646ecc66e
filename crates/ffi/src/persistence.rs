use std::ffi::CString;
use std::os::raw::c_char;

use crate::error::{BurnscarErrorCode, DefaultBurnscarError};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, str_from_ptr, with_engine_mut};
use crate::instance::BurnscarInstance;

/// Serialize the pending soil queue to JSON for the host's save file.
///
/// Only pending soil survives a save; burning blocks, cooldowns and pending
/// fellings are volatile.
///
/// On success `out_json` receives an owned, NUL-terminated string that MUST be
/// released with `burnscar_free_string`. On failure it is set to null.
///
/// Returns
/// - `BurnscarErrorCode::Ok` (0) on success
/// - `BurnscarErrorCode::NullPointer` if `ptr` or `out_json` is null
/// - `BurnscarErrorCode::InvalidSnapshot` if serialization fails
/// - `BurnscarErrorCode::LockPoisoned` if the engine lock is poisoned
///
/// # Safety
/// `out_json` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn burnscar_save_pending(
    ptr: *const BurnscarInstance,
    out_json: *mut *mut c_char,
) -> BurnscarErrorCode {
    if out_json.is_null() {
        return handle_ffi_result_error(|| Err(DefaultBurnscarError::null_pointer("out_json")));
    }
    // SAFETY: checked non-null above.
    unsafe {
        *out_json = std::ptr::null_mut();
    }

    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let json = with_engine_mut(instance, |engine, _world| engine.save_pending_json())?
            .map_err(|e| DefaultBurnscarError::invalid_snapshot(&e))?;
        // JSON never contains an interior NUL
        let json = CString::new(json)
            .map_err(|e| DefaultBurnscarError::invalid_parameter(e.to_string()))?;
        // SAFETY: checked non-null above.
        unsafe {
            *out_json = json.into_raw();
        }
        Ok(())
    })
}

/// Restore the pending soil queue from JSON written by `burnscar_save_pending`.
///
/// Resets every volatile registry. Records whose block is no longer soil are
/// dropped. `out_restored` may be null; otherwise it receives the number of
/// records kept.
///
/// Returns
/// - `BurnscarErrorCode::Ok` (0) on success
/// - `BurnscarErrorCode::NullPointer` if `ptr` or `json` is null
/// - `BurnscarErrorCode::InvalidString` if `json` is not UTF-8
/// - `BurnscarErrorCode::InvalidSnapshot` if the JSON is malformed or from another format version
/// - `BurnscarErrorCode::LockPoisoned` if the engine lock is poisoned
///
/// # Safety
/// - `json` must be a valid NUL-terminated string.
/// - `out_restored` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn burnscar_load_pending(
    ptr: *const BurnscarInstance,
    json: *const c_char,
    out_restored: *mut u64,
) -> BurnscarErrorCode {
    handle_ffi_result_error(|| {
        let instance = instance_from_ptr(ptr)?;
        let json = str_from_ptr(json, "json")?;
        let restored = with_engine_mut(instance, |engine, world| engine.load_pending_json(&*world, json))?
            .map_err(|e| DefaultBurnscarError::invalid_snapshot(&e))?;
        if !out_restored.is_null() {
            // SAFETY: non-null and writable per the contract above.
            unsafe {
                *out_restored = restored as u64;
            }
        }
        Ok(())
    })
}

/// Free a string returned by `burnscar_save_pending`. Null is a no-op.
///
/// # Safety
/// `s` must have been returned by this library and not freed already.
#[no_mangle]
pub unsafe extern "C" fn burnscar_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    // SAFETY: the string was produced by `CString::into_raw` in this crate.
    unsafe {
        drop(CString::from_raw(s));
    }
}
