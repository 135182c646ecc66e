//! Burnt-soil conversion
//!
//! Strips a soil-like block to its bare (no-cover) variant and, for true soil,
//! rolls a fertility upgrade. Hosts name bare variants inconsistently, so a
//! short ordered list of cover names is tried.

use crate::core_types::block::{BlockClassifier, BlockCode, BlockKind};
use crate::core_types::fertility::FertilityTier;
use crate::core_types::position::BlockPos;
use crate::world::World;
use tracing::{debug, error, info};

/// Cover segments tried in order when looking up the bare variant
pub const BARE_COVERS: [&str; 3] = ["none", "no-grass", "free"];

/// Tier forest floor is converted to
const FOREST_FLOOR_TIER: FertilityTier = FertilityTier::Medium;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    /// The block is not soil-like (or no longer is)
    NotSoil,
    /// None of the bare variants exist for this block
    MissingBareVariant { stem: String },
    /// The host refused the block write
    Rejected { code: BlockCode },
    /// Cover stripped, fertility unchanged
    Converted { from: BlockCode, to: BlockCode },
    /// Cover stripped and fertility upgraded
    Upgraded {
        from: BlockCode,
        to: BlockCode,
        tier: FertilityTier,
    },
}

impl ConversionOutcome {
    /// Whether the world was changed
    pub fn is_converted(&self) -> bool {
        matches!(
            self,
            ConversionOutcome::Converted { .. } | ConversionOutcome::Upgraded { .. }
        )
    }
}

/// Path stem of the bare variant plus the tier to roll from, if any
fn bare_stem(kind: &BlockKind, classifier: &BlockClassifier) -> Option<(String, Option<String>)> {
    match kind {
        BlockKind::Soil { tier, .. } => Some((format!("soil-{tier}"), Some(tier.clone()))),
        BlockKind::Compost { .. } => Some(("cob".to_owned(), None)),
        BlockKind::ForestFloor if classifier.forest_floor_is_soil() => Some((
            format!("soil-{}", FOREST_FLOOR_TIER.code()),
            Some(FOREST_FLOOR_TIER.code().to_owned()),
        )),
        _ => None,
    }
}

/// First existing bare variant of `stem` in the domain of `like`
fn find_bare_variant<W: World + ?Sized>(world: &W, like: &BlockCode, stem: &str) -> Option<BlockCode> {
    BARE_COVERS
        .iter()
        .map(|cover| like.with_path(format!("{stem}-{cover}")))
        .find(|code| world.has_block_type(code))
}

/// Convert the block at `pos` to bare soil and roll its fertility.
///
/// `upgrade` maps the current tier to the rolled tier; it is only called for
/// true soil with a recognised tier, never for compost.
pub fn try_convert_to_barren_soil<W, F>(
    world: &mut W,
    classifier: &BlockClassifier,
    pos: BlockPos,
    upgrade: F,
) -> ConversionOutcome
where
    W: World + ?Sized,
    F: FnOnce(FertilityTier) -> FertilityTier,
{
    let Some(state) = world.block(pos) else {
        return ConversionOutcome::NotSoil;
    };
    let kind = classifier.classify(&state.code);
    let Some((stem, tier)) = bare_stem(&kind, classifier) else {
        debug!(%pos, code = %state.code, "cannot convert: not a soil block");
        return ConversionOutcome::NotSoil;
    };

    let Some(bare) = find_bare_variant(world, &state.code, &stem) else {
        error!(
            %pos,
            code = %state.code,
            tried = ?BARE_COVERS,
            "failed to find bare soil variant"
        );
        return ConversionOutcome::MissingBareVariant { stem };
    };
    if !world.set_block(pos, &bare) {
        error!(%pos, code = %bare, "host rejected soil conversion");
        return ConversionOutcome::Rejected { code: bare };
    }
    info!(%pos, from = %state.code, to = %bare, "converted soil block");

    let Some(current) = tier.as_deref().and_then(FertilityTier::from_code) else {
        if let Some(tier) = tier {
            debug!(%pos, tier, "unknown fertility tier, no upgrade");
        }
        return ConversionOutcome::Converted {
            from: state.code,
            to: bare,
        };
    };

    let rolled = upgrade(current);
    if rolled == current {
        return ConversionOutcome::Converted {
            from: state.code,
            to: bare,
        };
    }

    let upgraded_stem = format!("soil-{}", rolled.code());
    let Some(upgraded) = find_bare_variant(world, &state.code, &upgraded_stem) else {
        error!(%pos, stem = %upgraded_stem, "failed to find upgraded soil variant");
        return ConversionOutcome::Converted {
            from: state.code,
            to: bare,
        };
    };
    if !world.set_block(pos, &upgraded) {
        error!(%pos, code = %upgraded, "host rejected fertility upgrade");
        return ConversionOutcome::Converted {
            from: state.code,
            to: bare,
        };
    }
    info!(%pos, from = %bare, to = %upgraded, "upgraded soil fertility");
    ConversionOutcome::Upgraded {
        from: state.code,
        to: upgraded,
        tier: rolled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockAttributes, MemoryWorld};

    fn world_with_soil_types() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        for tier in FertilityTier::ALL {
            world.register_type(format!("game:soil-{}-none", tier.code()).as_str(), BlockAttributes::default());
        }
        world.register_type("game:cob-none", BlockAttributes::default());
        world
    }

    #[test]
    fn test_strip_without_upgrade() {
        let mut world = world_with_soil_types();
        let pos = BlockPos::new(0, 9, 0);
        world.place(pos, "game:soil-low-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |t| t);
        assert!(matches!(outcome, ConversionOutcome::Converted { .. }));
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-low-none"));
    }

    #[test]
    fn test_strip_and_upgrade() {
        let mut world = world_with_soil_types();
        let pos = BlockPos::new(0, 9, 0);
        world.place(pos, "game:soil-low-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |_| FertilityTier::Medium);
        assert_eq!(
            outcome,
            ConversionOutcome::Upgraded {
                from: "game:soil-low-normal".into(),
                to: "game:soil-medium-none".into(),
                tier: FertilityTier::Medium,
            }
        );
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-medium-none"));
    }

    #[test]
    fn test_compost_never_upgrades() {
        let mut world = world_with_soil_types();
        let pos = BlockPos::new(1, 1, 1);
        world.place(pos, "game:cob-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |_| {
            panic!("compost must not roll")
        });
        assert!(outcome.is_converted());
        assert_eq!(world.code_at(pos).as_deref(), Some("game:cob-none"));
    }

    #[test]
    fn test_fallback_cover_names() {
        let mut world = MemoryWorld::new();
        world.register_type("game:soil-verylow-free", BlockAttributes::default());
        let pos = BlockPos::new(0, 0, 0);
        world.place(pos, "game:soil-verylow-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |t| t);
        assert!(outcome.is_converted());
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-verylow-free"));
    }

    #[test]
    fn test_missing_bare_variant_leaves_block() {
        let mut world = MemoryWorld::new();
        let pos = BlockPos::new(0, 0, 0);
        world.place(pos, "game:soil-low-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |t| t);
        assert_eq!(
            outcome,
            ConversionOutcome::MissingBareVariant {
                stem: "soil-low".into()
            }
        );
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-low-normal"));
    }

    #[test]
    fn test_missing_upgrade_variant_keeps_bare_soil() {
        let mut world = MemoryWorld::new();
        world.register_type("game:soil-low-none", BlockAttributes::default());
        let pos = BlockPos::new(0, 0, 0);
        world.place(pos, "game:soil-low-normal");
        let classifier = BlockClassifier::default();

        let outcome = try_convert_to_barren_soil(&mut world, &classifier, pos, |_| FertilityTier::TerraPreta);
        assert!(matches!(outcome, ConversionOutcome::Converted { .. }));
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-low-none"));
    }

    #[test]
    fn test_forest_floor_toggle() {
        let mut world = world_with_soil_types();
        let pos = BlockPos::new(0, 0, 0);
        world.place(pos, "game:forestfloor-4");

        let off = BlockClassifier::default();
        assert_eq!(
            try_convert_to_barren_soil(&mut world, &off, pos, |t| t),
            ConversionOutcome::NotSoil
        );

        let on = BlockClassifier::new(
            vec!["log".into()],
            Vec::new(),
            vec!["leaves".into()],
            true,
        );
        let outcome = try_convert_to_barren_soil(&mut world, &on, pos, |t| {
            assert_eq!(t, FertilityTier::Medium);
            t
        });
        assert!(outcome.is_converted());
        assert_eq!(world.code_at(pos).as_deref(), Some("game:soil-medium-none"));
    }

    #[test]
    fn test_non_soil_untouched() {
        let mut world = world_with_soil_types();
        let pos = BlockPos::new(0, 0, 0);
        world.place(pos, "game:rock-granite");
        let classifier = BlockClassifier::default();

        assert_eq!(
            try_convert_to_barren_soil(&mut world, &classifier, pos, |t| t),
            ConversionOutcome::NotSoil
        );
        assert_eq!(
            try_convert_to_barren_soil(&mut world, &classifier, BlockPos::new(5, 5, 5), |t| t),
            ConversionOutcome::NotSoil
        );
    }
}
