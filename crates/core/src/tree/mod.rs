//! Tree felling: locating a burning tree, discovering its structure and
//! gating repeated fellings

pub mod felling;
pub mod locator;
pub mod search;

pub use felling::{FellingController, FellingCooldownState, FellingOutcome, FireAssociation};
pub use locator::{find_nearby_log, find_tree_base, find_tree_base_from_leaf, LocatePass, LocatedTree};
pub use search::{find_tree, is_connected_to_log, ScannedLeaf, SearchLimits, TreeScan};
