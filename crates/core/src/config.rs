//! Engine configuration
//!
//! All tunables live in one serde struct so a host can ship them as a JSON file.
//! Missing fields fall back to their defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for tree felling, burning and soil conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base probability of verylow → low
    pub very_low_to_low: f64,
    /// Base probability of low → medium
    pub low_to_medium: f64,
    /// Base probability of medium → compost
    pub medium_to_compost: f64,
    /// Base probability of compost → terra preta
    pub compost_to_terra_preta: f64,
    /// Dampening applied once per additional tier skipped in a single roll
    pub multi_tier_modifier: f64,
    /// Treat forest floor as soil (converted to bare medium soil)
    pub convert_forest_floor_to_soil: bool,

    /// Seconds a log burns before it is destroyed
    pub log_burn_duration: f64,
    /// Seconds a leaf burns before it is destroyed
    pub leaf_burn_duration: f64,
    /// Seconds any other registered block burns
    pub fallback_burn_duration: f64,

    /// Horizontal radius of the tree search around the root log
    pub leaf_search_radius: f32,
    /// Step bound of the leaf-to-log connectivity check
    pub leaf_connectivity_depth: u32,

    /// Categories recognised as logs
    pub tree_log_prefixes: Vec<String>,
    /// Log categories that carry a spread index
    pub segmented_log_prefixes: Vec<String>,
    /// Categories recognised as foliage
    pub leaf_prefixes: Vec<String>,

    /// Cooldown and "active" window after a tree is felled
    pub felling_cooldown_seconds: f64,
    /// Delay between ignition and the felling attempt (0 = immediate)
    pub felling_delay_seconds: f64,

    /// Resolve soil as soon as a fire is placed above it
    pub immediate_soil_conversion: bool,
    /// Pending soil is resolved after this long regardless of the fire
    pub soil_timeout_seconds: f64,
    /// Grace delay before a pending record may resolve
    pub soil_min_delay_seconds: f64,

    /// World bottom for downward scans
    pub world_min_y: i32,
    /// Maximum number of events buffered before the engine is ready
    pub inbox_capacity: usize,
    /// Fertility RNG seed (`None` = OS entropy)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            very_low_to_low: 0.9,
            low_to_medium: 0.5,
            medium_to_compost: 0.25,
            compost_to_terra_preta: 0.05,
            multi_tier_modifier: 0.1,
            convert_forest_floor_to_soil: false,

            log_burn_duration: 80.0,
            leaf_burn_duration: 40.0,
            fallback_burn_duration: 40.0,

            leaf_search_radius: 20.0,
            leaf_connectivity_depth: 8,

            tree_log_prefixes: vec!["log".into(), "logsection".into()],
            segmented_log_prefixes: vec!["logsection".into()],
            leaf_prefixes: vec!["leaves".into(), "leavesbranchy".into()],

            felling_cooldown_seconds: 15.0,
            felling_delay_seconds: 0.0,

            immediate_soil_conversion: true,
            soil_timeout_seconds: 60.0,
            soil_min_delay_seconds: 0.5,

            world_min_y: 0,
            inbox_capacity: 4096,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    ///
    /// # Errors
    /// Returns error if the text is not valid JSON or a value is out of range
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
    }

    /// Load config from file
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Save config to file
    ///
    /// # Errors
    /// Returns error if config cannot be serialized or written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = self.to_json()?;
        fs::write(path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        Ok(())
    }

    /// Check every field against the range the engine can run with
    ///
    /// # Errors
    /// Returns the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("very_low_to_low", self.very_low_to_low),
            ("low_to_medium", self.low_to_medium),
            ("medium_to_compost", self.medium_to_compost),
            ("compost_to_terra_preta", self.compost_to_terra_preta),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(field, format!("{p} is not within [0, 1]")));
            }
        }
        if self.multi_tier_modifier.is_nan() || self.multi_tier_modifier < 0.0 {
            return Err(invalid(
                "multi_tier_modifier",
                format!("{} must not be negative", self.multi_tier_modifier),
            ));
        }

        let durations = [
            ("log_burn_duration", self.log_burn_duration),
            ("leaf_burn_duration", self.leaf_burn_duration),
            ("fallback_burn_duration", self.fallback_burn_duration),
            ("soil_timeout_seconds", self.soil_timeout_seconds),
        ];
        for (field, d) in durations {
            if d.is_nan() || d <= 0.0 {
                return Err(invalid(field, format!("{d} must be positive")));
            }
        }
        let non_negative = [
            ("felling_cooldown_seconds", self.felling_cooldown_seconds),
            ("felling_delay_seconds", self.felling_delay_seconds),
            ("soil_min_delay_seconds", self.soil_min_delay_seconds),
        ];
        for (field, d) in non_negative {
            if d.is_nan() || d < 0.0 {
                return Err(invalid(field, format!("{d} must not be negative")));
            }
        }

        if self.leaf_search_radius.is_nan() || self.leaf_search_radius <= 0.0 {
            return Err(invalid(
                "leaf_search_radius",
                format!("{} must be positive", self.leaf_search_radius),
            ));
        }
        if self.tree_log_prefixes.iter().all(String::is_empty) {
            return Err(invalid(
                "tree_log_prefixes",
                "at least one log category is required".into(),
            ));
        }
        if self.inbox_capacity == 0 {
            return Err(invalid("inbox_capacity", "must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
