//! Block type identifiers and their structured classification
//!
//! Hosts name block types with namespaced, hyphen-segmented codes such as
//! `game:log-grown-oak-ud` or `game:soil-low-normal`. The code is parsed once
//! at the world boundary into a [`BlockKind`]; the tree and soil logic only
//! ever matches on the structured form.

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain assumed when a code carries no `domain:` prefix
pub const DEFAULT_DOMAIN: &str = "game";

/// Namespaced block type identifier (`domain:path`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BlockCode {
    domain: String,
    path: String,
}

impl BlockCode {
    /// Build a code from an explicit domain and path
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
        }
    }

    /// Parse `domain:path`, defaulting the domain to `game`
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((domain, path)) => Self::new(domain, path),
            None => Self::new(DEFAULT_DOMAIN, raw),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First path segment, e.g. `log` for `game:log-grown-oak-ud`
    pub fn category(&self) -> &str {
        self.path.split('-').next().unwrap_or_default()
    }

    /// Path segment at `index` (segment 0 is the category)
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.path.split('-').nth(index)
    }

    pub fn segment_count(&self) -> usize {
        self.path.split('-').count()
    }

    /// Group tag encoded in the identifier itself (third segment).
    ///
    /// `None` when the code has too few segments to carry one.
    pub fn group_segment(&self) -> Option<&str> {
        self.segment(2).filter(|s| !s.is_empty())
    }

    /// Same domain, different path
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(self.domain.clone(), path)
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path)
    }
}

impl From<String> for BlockCode {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for BlockCode {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<BlockCode> for String {
    fn from(code: BlockCode) -> Self {
        code.to_string()
    }
}

/// Semantic role of a block, decided once from its code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Air,
    Fire,
    /// Trunk or branch wood; `segmented` pieces carry a spread index
    Log { segmented: bool },
    Leaves,
    /// `soil-<tier>-<cover>`
    Soil { tier: String, cover: String },
    /// `cob-<cover>`; stripped of cover but never upgraded
    Compost { cover: String },
    ForestFloor,
    TallGrass,
    Other,
}

impl BlockKind {
    pub fn is_air(&self) -> bool {
        matches!(self, BlockKind::Air)
    }

    pub fn is_log(&self) -> bool {
        matches!(self, BlockKind::Log { .. })
    }

    pub fn is_segmented_log(&self) -> bool {
        matches!(self, BlockKind::Log { segmented: true })
    }

    pub fn is_leaves(&self) -> bool {
        matches!(self, BlockKind::Leaves)
    }

    pub fn is_fire(&self) -> bool {
        matches!(self, BlockKind::Fire)
    }
}

/// Classifies block codes according to the configured category prefixes
#[derive(Debug, Clone, PartialEq)]
pub struct BlockClassifier {
    log_prefixes: Vec<String>,
    segmented_prefixes: Vec<String>,
    leaf_prefixes: Vec<String>,
    forest_floor_is_soil: bool,
}

impl BlockClassifier {
    pub fn new(
        log_prefixes: Vec<String>,
        segmented_prefixes: Vec<String>,
        leaf_prefixes: Vec<String>,
        forest_floor_is_soil: bool,
    ) -> Self {
        Self {
            log_prefixes,
            segmented_prefixes,
            leaf_prefixes,
            forest_floor_is_soil,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.tree_log_prefixes.clone(),
            config.segmented_log_prefixes.clone(),
            config.leaf_prefixes.clone(),
            config.convert_forest_floor_to_soil,
        )
    }

    /// Structured kind for a code. Log prefixes win over foliage prefixes.
    pub fn classify(&self, code: &BlockCode) -> BlockKind {
        let category = code.category();
        if category.is_empty() || category == "air" {
            return BlockKind::Air;
        }
        if self.log_prefixes.iter().any(|p| p == category) {
            return BlockKind::Log {
                segmented: self.segmented_prefixes.iter().any(|p| p == category),
            };
        }
        if self.leaf_prefixes.iter().any(|p| p == category) {
            return BlockKind::Leaves;
        }

        match category {
            "fire" => BlockKind::Fire,
            "soil" => match (code.segment(1), code.segment(2)) {
                (Some(tier), Some(cover)) if !tier.is_empty() => BlockKind::Soil {
                    tier: tier.to_owned(),
                    cover: cover.to_owned(),
                },
                _ => BlockKind::Other,
            },
            "cob" => BlockKind::Compost {
                cover: code.segment(1).unwrap_or("none").to_owned(),
            },
            "forestfloor" => BlockKind::ForestFloor,
            "tallgrass" => BlockKind::TallGrass,
            _ => BlockKind::Other,
        }
    }

    /// Whether fire above this block triggers a soil conversion
    pub fn is_soil_like(&self, kind: &BlockKind) -> bool {
        match kind {
            BlockKind::Soil { .. } | BlockKind::Compost { .. } => true,
            BlockKind::ForestFloor => self.forest_floor_is_soil,
            _ => false,
        }
    }

    pub fn forest_floor_is_soil(&self) -> bool {
        self.forest_floor_is_soil
    }
}

impl Default for BlockClassifier {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
