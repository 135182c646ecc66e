use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait BurnscarError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> BurnscarErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `BurnscarError` for the FFI failure cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultBurnscarError {
    code: BurnscarErrorCode,
    msg: String,
}

impl DefaultBurnscarError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: BurnscarErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned (e.g., `"engine"`)
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: BurnscarErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for a config the engine rejected.
    pub fn invalid_config(error: &burnscar_core::ConfigError) -> Self {
        Self {
            code: BurnscarErrorCode::InvalidConfig,
            msg: error.to_string(),
        }
    }

    /// Create error for a pending-soil snapshot that could not be encoded or decoded.
    pub fn invalid_snapshot(error: &burnscar_core::SnapshotError) -> Self {
        Self {
            code: BurnscarErrorCode::InvalidSnapshot,
            msg: error.to_string(),
        }
    }

    /// Create error for a C string argument that is not valid UTF-8.
    ///
    /// # Arguments
    /// * `param_name` - The name of the offending parameter
    pub fn invalid_string(param_name: &str) -> Self {
        Self {
            code: BurnscarErrorCode::InvalidString,
            msg: format!("Parameter '{param_name}' is not valid UTF-8"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: BurnscarErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl BurnscarError for DefaultBurnscarError {
    fn code(&self) -> BurnscarErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by burnscar functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnscarErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: the engine lock was poisoned by a panic.
    LockPoisoned = 2,

    /// Config JSON could not be parsed or failed validation.
    InvalidConfig = 3,

    /// Pending-soil snapshot could not be encoded or decoded.
    InvalidSnapshot = 4,

    /// A string argument was not valid UTF-8.
    InvalidString = 5,

    /// Invalid parameter passed to function (e.g. a non-finite time).
    InvalidParameter = 6,
}

impl From<DefaultBurnscarError> for BurnscarErrorCode {
    fn from(error: DefaultBurnscarError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, BurnscarErrorCode)> = const { RefCell::new((None, BurnscarErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, BurnscarErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, BurnscarErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call on this thread succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// BurnscarInstance* engine = nullptr;
/// BurnscarErrorCode err = burnscar_new(config_json, callbacks, &engine);
/// if (err != BurnscarErrorCode::Ok) {
///     const char* error = burnscar_get_last_error();
///     if (error) {
///         printf("Engine creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn burnscar_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `BurnscarErrorCode::Ok` (0) if the last call on this thread succeeded.
/// Error state is per-thread.
#[no_mangle]
pub extern "C" fn burnscar_get_last_error_code() -> BurnscarErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
