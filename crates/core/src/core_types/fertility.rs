//! Soil fertility tiers
//!
//! Tiers form a strict chain: verylow → low → medium → compost → terra preta.
//! Terra preta is the ceiling and is spelled `high` in block codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered soil quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FertilityTier {
    VeryLow,
    Low,
    Medium,
    /// Compost-grade (high) soil
    Compost,
    /// Terra preta, the ceiling
    TerraPreta,
}

impl FertilityTier {
    /// All tiers from lowest to highest
    pub const ALL: [FertilityTier; 5] = [
        FertilityTier::VeryLow,
        FertilityTier::Low,
        FertilityTier::Medium,
        FertilityTier::Compost,
        FertilityTier::TerraPreta,
    ];

    /// Parse the tier segment of a soil code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "verylow" => Some(FertilityTier::VeryLow),
            "low" => Some(FertilityTier::Low),
            "medium" => Some(FertilityTier::Medium),
            "compost" => Some(FertilityTier::Compost),
            "high" | "terrapreta" => Some(FertilityTier::TerraPreta),
            _ => None,
        }
    }

    /// Tier segment used in soil block codes
    pub fn code(self) -> &'static str {
        match self {
            FertilityTier::VeryLow => "verylow",
            FertilityTier::Low => "low",
            FertilityTier::Medium => "medium",
            FertilityTier::Compost => "compost",
            FertilityTier::TerraPreta => "high",
        }
    }

    /// Next tier up the chain, `None` at the ceiling
    pub fn next(self) -> Option<Self> {
        match self {
            FertilityTier::VeryLow => Some(FertilityTier::Low),
            FertilityTier::Low => Some(FertilityTier::Medium),
            FertilityTier::Medium => Some(FertilityTier::Compost),
            FertilityTier::Compost => Some(FertilityTier::TerraPreta),
            FertilityTier::TerraPreta => None,
        }
    }

    pub fn is_ceiling(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for FertilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
