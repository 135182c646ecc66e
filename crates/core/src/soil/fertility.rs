//! Fertility upgrade resolver
//!
//! A single roll in [0, 1) is checked against a chain of thresholds. The first
//! threshold is the base probability of the next tier; every further tier
//! multiplies in the dampening modifier and that transition's own probability:
//!
//! ```text
//! t1 = p(tier)
//! t(k+1) = t(k) * modifier * p(tier + k)
//! ```
//!
//! Thresholds shrink monotonically, so the deepest jump whose threshold exceeds
//! the roll wins. Terra preta never upgrades.

use crate::config::EngineConfig;
use crate::core_types::fertility::FertilityTier;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FertilityResolver {
    very_low_to_low: f64,
    low_to_medium: f64,
    medium_to_compost: f64,
    compost_to_terra_preta: f64,
    multi_tier_modifier: f64,
}

impl Default for FertilityResolver {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl FertilityResolver {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            very_low_to_low: config.very_low_to_low,
            low_to_medium: config.low_to_medium,
            medium_to_compost: config.medium_to_compost,
            compost_to_terra_preta: config.compost_to_terra_preta,
            multi_tier_modifier: config.multi_tier_modifier,
        }
    }

    /// Base probability of moving from `tier` to the next tier
    fn transition_probability(&self, tier: FertilityTier) -> f64 {
        match tier {
            FertilityTier::VeryLow => self.very_low_to_low,
            FertilityTier::Low => self.low_to_medium,
            FertilityTier::Medium => self.medium_to_compost,
            FertilityTier::Compost => self.compost_to_terra_preta,
            FertilityTier::TerraPreta => 0.0,
        }
    }

    /// Threshold for every reachable target tier, nearest first
    pub fn thresholds(&self, tier: FertilityTier) -> Vec<(FertilityTier, f64)> {
        let mut chain = Vec::new();
        let mut from = tier;
        let mut threshold = 1.0;
        while let Some(to) = from.next() {
            if !chain.is_empty() {
                threshold *= self.multi_tier_modifier;
            }
            threshold *= self.transition_probability(from);
            chain.push((to, threshold));
            from = to;
        }
        chain
    }

    /// Tier reached from `tier` with a given roll in [0, 1)
    pub fn resolve(&self, tier: FertilityTier, roll: f64) -> FertilityTier {
        self.thresholds(tier)
            .into_iter()
            .rev()
            .find(|&(_, threshold)| roll < threshold)
            .map_or(tier, |(to, _)| to)
    }

    /// Draw a roll and resolve
    pub fn roll<R: Rng>(&self, tier: FertilityTier, rng: &mut R) -> FertilityTier {
        let roll: f64 = rng.random();
        let upgraded = self.resolve(tier, roll);
        debug!(roll, from = %tier, to = %upgraded, "fertility upgrade roll");
        upgraded
    }

    /// Resolve a tier given by its code name.
    ///
    /// The input comes back verbatim when no upgrade happens, including unknown
    /// tiers and the ceiling. Only a real upgrade yields a block-code tier name.
    pub fn upgrade_code(&self, tier: &str, roll: f64) -> String {
        match FertilityTier::from_code(tier) {
            Some(parsed) => match self.resolve(parsed, roll) {
                upgraded if upgraded == parsed => tier.to_owned(),
                upgraded => upgraded.code().to_owned(),
            },
            None => {
                debug!(tier, "unknown fertility tier");
                tier.to_owned()
            }
        }
    }
}
