//! Burnscar Core Library
//!
//! Fire aftermath mechanics for voxel worlds: when a fire is placed the engine
//! finds the tree it is burning, discovers the whole tree (trunk first, then
//! attached canopy) and schedules every block for timed destruction. The soil
//! beneath the fire is stripped to its bare variant and may gain fertility.
//!
//! ## Structure
//!
//! - [`world`]: the host capability trait and the classifying query boundary
//! - [`tree`]: tree locator, two-phase tree search, felling controller
//! - [`soil`]: fertility resolver, pending soil queue, bare-soil conversion
//! - [`simulation`]: burn scheduler, inbox and the tick orchestrator ([`Engine`])
//!
//! The host owns block storage and time. Every entry point borrows the world and
//! takes the current time in seconds.

// Core types and utilities
pub mod core_types;

pub mod config;
pub mod error;
pub mod simulation;
pub mod soil;
pub mod tree;
pub mod world;

// Re-export core types
pub use core_types::{BlockClassifier, BlockCode, BlockKind, BlockPos, FertilityTier, TreeIdentity};

pub use config::EngineConfig;
pub use error::{ConfigError, SnapshotError};
pub use simulation::{Engine, EngineState, EngineStats, SharedEngine, TickReport};
pub use soil::{ConversionOutcome, PendingSoilSnapshot};
pub use tree::{FellingOutcome, TreeScan};
pub use world::{BlockAttributes, BlockState, MemoryWorld, World, WorldQuery};
