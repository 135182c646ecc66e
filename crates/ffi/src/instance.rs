use burnscar_core::{Engine, EngineConfig};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Mutex;

use crate::error::{BurnscarErrorCode, DefaultBurnscarError};
use crate::helpers::{str_from_ptr, track_error, track_result};
use crate::host::BurnscarHostCallbacks;

/// The burnscar engine context.
///
/// Holds the engine behind a `Mutex` together with the host's callback table.
/// Every entry point locks the engine for its whole duration, so fire events
/// from a block-update thread and ticks from a server thread never interleave.
///
/// # Usage
/// ```cpp
/// BurnscarInstance* engine = nullptr;
/// if (burnscar_new(nullptr, callbacks, &engine) != BurnscarErrorCode::Ok) {
///     return;
/// }
/// // After the world has loaded:
/// burnscar_mark_ready(engine, now);
///
/// // Fire hooks
/// burnscar_on_ignite(engine, x, y, z, now);
/// burnscar_on_extinguish(engine, x, y, z, now);
///
/// // Fixed-rate server tick
/// burnscar_tick(engine, now, nullptr);
///
/// burnscar_destroy(engine);
/// ```
pub struct BurnscarInstance {
    pub(crate) engine: Mutex<Engine>,
    pub(crate) callbacks: BurnscarHostCallbacks,
}

impl BurnscarInstance {
    /// Creates a new instance from an optional JSON config.
    ///
    /// # Errors
    ///
    /// Returns `BurnscarErrorCode::NullPointer` if a required callback is missing.
    /// Returns `BurnscarErrorCode::InvalidConfig` if the config fails to parse or validate.
    pub(crate) fn new(
        config_json: Option<&str>,
        callbacks: BurnscarHostCallbacks,
    ) -> Result<Box<Self>, DefaultBurnscarError> {
        if let Some(missing) = callbacks.missing_required() {
            return Err(DefaultBurnscarError::null_pointer(missing));
        }

        let config = match config_json {
            Some(json) => {
                EngineConfig::from_json(json).map_err(|e| DefaultBurnscarError::invalid_config(&e))?
            }
            None => EngineConfig::default(),
        };
        let engine = Engine::new(config).map_err(|e| DefaultBurnscarError::invalid_config(&e))?;

        Ok(Box::new(Self {
            engine: Mutex::new(engine),
            callbacks,
        }))
    }
}

/// Create a new engine instance and return it via out-parameter.
///
/// - Returns `BurnscarErrorCode::Ok` (0) on success with a valid instance in `out_instance`
/// - Returns non-zero error code on failure with `out_instance` set to null
///
/// Parameters
/// - `config_json`: `EngineConfig` as JSON, or null for defaults. Missing fields
///   take their default values.
/// - `callbacks`: host capability table, copied into the instance.
/// - `out_instance`: Pointer to receive the created instance. Must be non-null.
///
/// The instance starts uninitialized: fire events are buffered until
/// `burnscar_mark_ready` is called.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - `config_json` must be null or a valid NUL-terminated string.
/// - The callbacks and `user_data` must stay valid until `burnscar_destroy`.
/// - The caller MUST call `burnscar_destroy` exactly once on the returned instance.
#[no_mangle]
pub unsafe extern "C" fn burnscar_new(
    config_json: *const c_char,
    callbacks: BurnscarHostCallbacks,
    out_instance: *mut *mut BurnscarInstance,
) -> BurnscarErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultBurnscarError::null_pointer("out_instance"));
    }

    let created = if config_json.is_null() {
        BurnscarInstance::new(None, callbacks)
    } else {
        str_from_ptr(config_json, "config_json")
            .and_then(|json| BurnscarInstance::new(Some(json), callbacks))
    };

    match track_result(created) {
        Ok(instance) => {
            // SAFETY: checked non-null above; the caller guarantees it is writable.
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            BurnscarErrorCode::Ok
        }
        Err(code) => {
            // SAFETY: as above.
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroys an instance previously created by `burnscar_new`.
///
/// A null `ptr` is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `burnscar_new` and not freed already.
/// - The caller must not use the pointer again afterwards.
#[no_mangle]
pub unsafe extern "C" fn burnscar_destroy(ptr: *mut BurnscarInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: the pointer came from `Box::into_raw` in `burnscar_new` and has
    // not been freed; reclaiming the Box drops the engine.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
