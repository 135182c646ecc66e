//! Time-driven side of the engine: burning blocks, deferred timers, the host
//! event inbox and the tick orchestrator

pub mod burn;
pub mod engine;
pub mod events;
pub mod stats;
pub mod timers;

pub use burn::{BurnDurations, BurnOutcome, BurnReport, BurnRole, BurnScheduler, BurningBlockRecord};
pub use engine::{Engine, EngineState, ExtinguishReport, IgniteReport, SharedEngine};
pub use events::{EventInbox, HostEvent, HostEventKind};
pub use stats::{EngineStats, TickReport};
pub use timers::DeferredTimers;
