//! Core types and utilities

pub mod block;
pub mod fertility;
pub mod position;
pub mod tag;

pub use block::{BlockClassifier, BlockCode, BlockKind};
pub use fertility::FertilityTier;
pub use position::BlockPos;
pub use tag::{leaf_tag_matches, strip_leaf_prefix, tag_matches, TreeIdentity};
