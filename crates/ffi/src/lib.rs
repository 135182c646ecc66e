//! C ABI for the burnscar engine.
//!
//! A game host creates one `BurnscarInstance` per world with `burnscar_new`,
//! passing a `BurnscarHostCallbacks` table through which the engine reads and
//! writes blocks. Fire hooks call `burnscar_on_ignite` / `burnscar_on_extinguish`,
//! the server loop calls `burnscar_tick`, and the save hooks call
//! `burnscar_save_pending` / `burnscar_load_pending`.
//!
//! Every function returns a `BurnscarErrorCode`; details of the last failure on
//! the calling thread are available from `burnscar_get_last_error`.
//!
//! The C header is generated by `build.rs` into `BurnscarFFI.h`.

mod error;
mod events;
mod helpers;
mod host;
mod instance;
mod persistence;
mod queries;

pub use error::{burnscar_get_last_error, burnscar_get_last_error_code, BurnscarErrorCode};
pub use events::{burnscar_mark_ready, burnscar_on_extinguish, burnscar_on_ignite, burnscar_tick};
pub use host::{
    BurnscarBreakBlockFn, BurnscarHasBlockTypeFn, BurnscarHostCallbacks, BurnscarReadSpreadIndexFn,
    BurnscarReadStringFn, BurnscarSetBlockFn,
};
pub use instance::{burnscar_destroy, burnscar_new, BurnscarInstance};
pub use persistence::{burnscar_free_string, burnscar_load_pending, burnscar_save_pending};
pub use queries::{burnscar_get_stats, BurnscarStats, BurnscarTickSummary};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::memory_callbacks;
    use burnscar_core::{BlockAttributes, BlockPos, MemoryWorld};
    use std::ffi::{CStr, CString};
    use std::os::raw::c_char;
    use std::ptr;

    fn oak_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        for tier in ["verylow", "low", "medium", "compost", "high"] {
            world.register_type(format!("game:soil-{tier}-none"), BlockAttributes::default());
        }
        world.place_with(BlockPos::new(0, 10, 0), "game:log-grown-oak-ud", BlockAttributes::tagged("oak"));
        world.place_with(BlockPos::new(0, 11, 0), "game:log-grown-oak-ud", BlockAttributes::tagged("oak"));
        world.place_with(BlockPos::new(1, 11, 0), "game:leaves-grown-oak", BlockAttributes::tagged("4oak"));
        world.place(BlockPos::new(1, 9, 0), "game:soil-low-normal");
        world.place(BlockPos::new(1, 10, 0), "game:fire");
        world
    }

    fn new_instance(world: &mut MemoryWorld, config: Option<&str>) -> *mut BurnscarInstance {
        let config = config.map(|c| CString::new(c).unwrap());
        let mut instance: *mut BurnscarInstance = ptr::null_mut();
        let code = unsafe {
            burnscar_new(
                config.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
                memory_callbacks(world),
                &mut instance,
            )
        };
        assert_eq!(code, BurnscarErrorCode::Ok);
        assert!(!instance.is_null());
        instance
    }

    fn stats(instance: *const BurnscarInstance) -> BurnscarStats {
        let mut stats = BurnscarStats::default();
        assert_eq!(unsafe { burnscar_get_stats(instance, &mut stats) }, BurnscarErrorCode::Ok);
        stats
    }

    #[test]
    fn test_full_lifecycle_through_c_abi() {
        let mut world = oak_world();
        let instance = new_instance(&mut world, Some(r#"{ "seed": 3 }"#));

        // Buffered until ready
        assert_eq!(burnscar_on_ignite(instance, 1, 10, 0, 0.0), BurnscarErrorCode::Ok);
        let before = stats(instance);
        assert!(!before.ready);
        assert_eq!(before.queued_events, 1);

        assert_eq!(burnscar_mark_ready(instance, 0.5), BurnscarErrorCode::Ok);
        let after = stats(instance);
        assert!(after.ready);
        assert_eq!(after.burning_blocks, 3);
        assert_eq!(after.trees_felled, 1);
        assert_eq!(after.soil_converted, 1);

        let mut summary = BurnscarTickSummary::default();
        assert_eq!(unsafe { burnscar_tick(instance, 100.0, &mut summary) }, BurnscarErrorCode::Ok);
        assert_eq!(summary.logs_destroyed, 2);
        assert_eq!(summary.leaves_destroyed, 1);

        unsafe { burnscar_destroy(instance) };
        assert!(world.code_at(BlockPos::new(0, 10, 0)).is_none());
        assert!(world
            .code_at(BlockPos::new(1, 9, 0))
            .is_some_and(|code| code.ends_with("-none")));
    }

    #[test]
    fn test_save_and_load_pending() {
        let mut world = oak_world();
        let instance = new_instance(&mut world, Some(r#"{ "immediate_soil_conversion": false }"#));
        assert_eq!(burnscar_mark_ready(instance, 0.0), BurnscarErrorCode::Ok);
        assert_eq!(burnscar_on_ignite(instance, 1, 10, 0, 0.0), BurnscarErrorCode::Ok);
        assert_eq!(stats(instance).pending_soil, 1);

        let mut json: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { burnscar_save_pending(instance, &mut json) }, BurnscarErrorCode::Ok);
        assert!(!json.is_null());
        let text = unsafe { CStr::from_ptr(json) }.to_str().unwrap().to_owned();
        assert!(text.contains("soil-low-normal"));

        let mut restored = 0u64;
        assert_eq!(
            unsafe { burnscar_load_pending(instance, json, &mut restored) },
            BurnscarErrorCode::Ok
        );
        assert_eq!(restored, 1);
        unsafe { burnscar_free_string(json) };

        let after = stats(instance);
        assert_eq!(after.pending_soil, 1);
        assert_eq!(after.burning_blocks, 0);
        unsafe { burnscar_destroy(instance) };
    }

    #[test]
    fn test_errors_are_reported() {
        let mut world = oak_world();

        let mut instance: *mut BurnscarInstance = ptr::null_mut();
        let bad = CString::new(r#"{ "low_to_medium": 3.0 }"#).unwrap();
        let code = unsafe { burnscar_new(bad.as_ptr(), memory_callbacks(&mut world), &mut instance) };
        assert_eq!(code, BurnscarErrorCode::InvalidConfig);
        assert!(instance.is_null());
        assert_eq!(burnscar_get_last_error_code(), BurnscarErrorCode::InvalidConfig);
        let msg = unsafe { CStr::from_ptr(burnscar_get_last_error()) }.to_string_lossy();
        assert!(msg.contains("low_to_medium"), "{msg}");

        assert_eq!(burnscar_tick_null(), BurnscarErrorCode::NullPointer);

        let instance = new_instance(&mut world, None);
        assert_eq!(burnscar_get_last_error_code(), BurnscarErrorCode::Ok);
        assert!(burnscar_get_last_error().is_null());
        assert_eq!(
            burnscar_on_ignite(instance, 0, 0, 0, f64::NAN),
            BurnscarErrorCode::InvalidParameter
        );

        let garbage = CString::new("not json").unwrap();
        assert_eq!(
            unsafe { burnscar_load_pending(instance, garbage.as_ptr(), ptr::null_mut()) },
            BurnscarErrorCode::InvalidSnapshot
        );
        unsafe { burnscar_destroy(instance) };
    }

    #[test]
    fn test_events_at_coordinate_limits() {
        let mut world = oak_world();
        let instance = new_instance(&mut world, None);
        assert_eq!(burnscar_mark_ready(instance, 0.0), BurnscarErrorCode::Ok);

        for (x, y, z) in [(i32::MAX, i32::MAX, i32::MAX), (i32::MIN, i32::MIN, i32::MIN)] {
            assert_eq!(burnscar_on_ignite(instance, x, y, z, 1.0), BurnscarErrorCode::Ok);
            assert_eq!(burnscar_on_extinguish(instance, x, y, z, 1.0), BurnscarErrorCode::Ok);
        }
        assert_eq!(
            unsafe { burnscar_tick(instance, 100.0, ptr::null_mut()) },
            BurnscarErrorCode::Ok
        );
        assert_eq!(stats(instance).trees_felled, 0);
        unsafe { burnscar_destroy(instance) };
    }

    fn burnscar_tick_null() -> BurnscarErrorCode {
        unsafe { burnscar_tick(ptr::null(), 1.0, ptr::null_mut()) }
    }
}
