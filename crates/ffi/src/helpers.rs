use crate::error::{with_last_error_mut, BurnscarError, BurnscarErrorCode, DefaultBurnscarError};
use crate::host::HostWorld;
use crate::instance::BurnscarInstance;
use burnscar_core::Engine;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl BurnscarError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl BurnscarError) -> BurnscarErrorCode {
    set_last_error(error);
    error.code()
}

/// Map a result to an error code, recording the error or clearing the last one.
pub(crate) fn track_result<T>(result: Result<T, DefaultBurnscarError>) -> Result<T, BurnscarErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run an FFI body and collapse its result into an error code.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> BurnscarErrorCode
where
    F: FnOnce() -> Result<(), DefaultBurnscarError>,
{
    match track_result(f()) {
        Ok(()) => BurnscarErrorCode::Ok,
        Err(code) => code,
    }
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = BurnscarErrorCode::Ok;
    });
}

/// Borrow an instance from a raw pointer, rejecting null.
pub(crate) fn instance_from_ptr<'a>(
    ptr: *const BurnscarInstance,
) -> Result<&'a BurnscarInstance, DefaultBurnscarError> {
    // SAFETY: callers pass pointers obtained from `burnscar_new` that have not
    // been destroyed; null is rejected here.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultBurnscarError::null_pointer("ptr"))
}

/// Lock the engine and run `f` with it and a world view over the host callbacks.
pub(crate) fn with_engine_mut<F, T>(instance: &BurnscarInstance, f: F) -> Result<T, DefaultBurnscarError>
where
    F: FnOnce(&mut Engine, &mut HostWorld<'_>) -> T,
{
    let mut engine = instance
        .engine
        .lock()
        .map_err(|_| DefaultBurnscarError::lock_poisoned("engine"))?;
    let mut world = HostWorld::new(&instance.callbacks);
    Ok(f(&mut engine, &mut world))
}

/// Borrow a C string argument as UTF-8.
pub(crate) fn str_from_ptr<'a>(ptr: *const c_char, param_name: &str) -> Result<&'a str, DefaultBurnscarError> {
    if ptr.is_null() {
        return Err(DefaultBurnscarError::null_pointer(param_name));
    }
    // SAFETY: non-null and, per every caller's contract, NUL-terminated and
    // valid for the duration of the call.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| DefaultBurnscarError::invalid_string(param_name))
}
