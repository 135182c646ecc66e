use burnscar_core::{BlockAttributes, BlockCode, BlockPos, BlockState, World};
use std::ffi::CString;
use std::os::raw::{c_char, c_void};

/// Initial buffer size for strings read back from the host
const INITIAL_STRING_CAPACITY: usize = 128;

/// Reads a string attribute of the block at (x, y, z) into `buf`.
///
/// Must write at most `buf_len` bytes and return the full length of the string
/// (without terminator). Return 0 when there is nothing to report. If the
/// returned length is `>= buf_len` the engine retries with a larger buffer.
pub type BurnscarReadStringFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    x: i32,
    y: i32,
    z: i32,
    buf: *mut c_char,
    buf_len: usize,
) -> usize;

/// Reads the spread index of the block at (x, y, z). Returns `false` if the
/// block has none.
pub type BurnscarReadSpreadIndexFn =
    unsafe extern "C" fn(user_data: *mut c_void, x: i32, y: i32, z: i32, out_index: *mut i32) -> bool;

/// Replaces the block at (x, y, z) with the block type named `code`. Returns
/// `false` if the host rejected the write.
pub type BurnscarSetBlockFn =
    unsafe extern "C" fn(user_data: *mut c_void, x: i32, y: i32, z: i32, code: *const c_char) -> bool;

/// Breaks the block at (x, y, z), leaving air.
pub type BurnscarBreakBlockFn = unsafe extern "C" fn(user_data: *mut c_void, x: i32, y: i32, z: i32);

/// Returns whether the host defines a block type named `code`.
pub type BurnscarHasBlockTypeFn = unsafe extern "C" fn(user_data: *mut c_void, code: *const c_char) -> bool;

/// Host capability table.
///
/// The engine never stores block data; every decision reads the world back
/// through these callbacks. All callbacks are invoked on the thread that made
/// the FFI call, while the engine lock is held. `user_data` is passed through
/// untouched.
///
/// `get_group_tag` and `get_spread_index` may be null; the engine then derives
/// tree tags from block codes and treats all trunks as unsegmented.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BurnscarHostCallbacks {
    pub user_data: *mut c_void,
    /// Block code at a position (`domain:path`); 0 for air or unloaded chunks.
    pub get_block_code: Option<BurnscarReadStringFn>,
    /// Tree group tag of the block at a position.
    pub get_group_tag: Option<BurnscarReadStringFn>,
    pub get_spread_index: Option<BurnscarReadSpreadIndexFn>,
    pub set_block: Option<BurnscarSetBlockFn>,
    pub break_block: Option<BurnscarBreakBlockFn>,
    pub has_block_type: Option<BurnscarHasBlockTypeFn>,
}

impl BurnscarHostCallbacks {
    /// Name of the first required callback that is missing
    pub(crate) fn missing_required(&self) -> Option<&'static str> {
        if self.get_block_code.is_none() {
            Some("callbacks.get_block_code")
        } else if self.set_block.is_none() {
            Some("callbacks.set_block")
        } else if self.break_block.is_none() {
            Some("callbacks.break_block")
        } else if self.has_block_type.is_none() {
            Some("callbacks.has_block_type")
        } else {
            None
        }
    }
}

/// [`World`] backed by host callbacks
pub(crate) struct HostWorld<'a> {
    callbacks: &'a BurnscarHostCallbacks,
}

impl<'a> HostWorld<'a> {
    pub(crate) fn new(callbacks: &'a BurnscarHostCallbacks) -> Self {
        Self { callbacks }
    }

    fn read_string(&self, read: Option<BurnscarReadStringFn>, pos: BlockPos) -> Option<String> {
        let read = read?;
        let mut buf = vec![0u8; INITIAL_STRING_CAPACITY];
        loop {
            // SAFETY: `buf` is valid for `buf.len()` bytes and the host contract
            // forbids writing past `buf_len`.
            let len = unsafe {
                read(
                    self.callbacks.user_data,
                    pos.x,
                    pos.y,
                    pos.z,
                    buf.as_mut_ptr().cast::<c_char>(),
                    buf.len(),
                )
            };
            if len == 0 {
                return None;
            }
            if len < buf.len() {
                buf.truncate(len);
                return Some(String::from_utf8_lossy(&buf).into_owned());
            }
            buf.resize(len + 1, 0);
        }
    }

    fn spread_index(&self, pos: BlockPos) -> Option<i32> {
        let read = self.callbacks.get_spread_index?;
        let mut index = 0;
        // SAFETY: `index` is a valid, writable i32 for the duration of the call.
        let present = unsafe { read(self.callbacks.user_data, pos.x, pos.y, pos.z, &mut index) };
        present.then_some(index)
    }
}

impl World for HostWorld<'_> {
    fn block(&self, pos: BlockPos) -> Option<BlockState> {
        let code = self.read_string(self.callbacks.get_block_code, pos)?;
        let attributes = BlockAttributes {
            group_tag: self.read_string(self.callbacks.get_group_tag, pos),
            spread_index: self.spread_index(pos),
        };
        Some(BlockState::new(code, attributes))
    }

    fn set_block(&mut self, pos: BlockPos, code: &BlockCode) -> bool {
        let Some(set) = self.callbacks.set_block else {
            return false;
        };
        let Ok(code) = CString::new(code.to_string()) else {
            return false;
        };
        // SAFETY: `code` is a NUL-terminated string that outlives the call.
        unsafe { set(self.callbacks.user_data, pos.x, pos.y, pos.z, code.as_ptr()) }
    }

    fn break_block(&mut self, pos: BlockPos) {
        if let Some(break_block) = self.callbacks.break_block {
            // SAFETY: plain value arguments; `user_data` is the host's own pointer.
            unsafe { break_block(self.callbacks.user_data, pos.x, pos.y, pos.z) }
        }
    }

    fn has_block_type(&self, code: &BlockCode) -> bool {
        let Some(has) = self.callbacks.has_block_type else {
            return false;
        };
        let Ok(code) = CString::new(code.to_string()) else {
            return false;
        };
        // SAFETY: `code` is a NUL-terminated string that outlives the call.
        unsafe { has(self.callbacks.user_data, code.as_ptr()) }
    }
}
