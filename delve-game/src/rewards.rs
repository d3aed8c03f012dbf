//! Reward scaling: raw encounter gains into energy, treasure, collectible
//! items and shortcuts.

use serde::{Deserialize, Serialize};

use crate::collections::{CollectedItem, CollectionCatalog, catalog};
use crate::constants::{REWARD_DEPTH_SCALE, SHORTCUT_REDUCTION_RATIO};
use crate::encounters::{EncounterKind, RawRewards};
use crate::energy::{Shortcut, raw_cost_between};
use crate::numbers::scale_u32;
use crate::seed::stable_hash;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessedRewards {
    pub energy: u32,
    pub treasure: u32,
    pub items: Vec<CollectedItem>,
    pub shortcut_levels: u32,
}

impl ProcessedRewards {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy == 0 && self.treasure == 0 && self.items.is_empty() && self.shortcut_levels == 0
    }
}

const fn kind_reward_weight(kind: EncounterKind) -> f64 {
    match kind {
        EncounterKind::PuzzleChamber => 1.2,
        EncounterKind::TradeOpportunity => 1.0,
        EncounterKind::DiscoverySite => 1.1,
        EncounterKind::Hazard => 1.3,
        EncounterKind::RiskEvent => 1.5,
        EncounterKind::RestSite => 0.8,
        EncounterKind::SafePassage => 0.0,
        EncounterKind::Scoundrel => 1.4,
    }
}

/// Combined depth and kind multiplier for rewards earned at `depth`.
#[must_use]
pub fn reward_multiplier(kind: EncounterKind, depth: u32) -> f64 {
    let depth_factor = REWARD_DEPTH_SCALE.mul_add(f64::from(depth.saturating_sub(1)), 1.0);
    depth_factor * kind_reward_weight(kind)
}

/// Scale `raw` for `kind` at `depth` against the bundled catalog.
#[must_use]
pub fn process_encounter_rewards(
    raw: &RawRewards,
    kind: EncounterKind,
    depth: u32,
) -> ProcessedRewards {
    process_encounter_rewards_with_catalog(catalog(), raw, kind, depth)
}

#[must_use]
pub fn process_encounter_rewards_with_catalog(
    catalog: &CollectionCatalog,
    raw: &RawRewards,
    kind: EncounterKind,
    depth: u32,
) -> ProcessedRewards {
    let multiplier = reward_multiplier(kind, depth);
    let sets: Vec<_> = catalog.sets_for(kind).collect();
    let items = if sets.is_empty() {
        Vec::new()
    } else {
        (0..raw.items)
            .map(|drop| {
                let roll = stable_hash(format!("{kind}:{depth}:{drop}").as_bytes());
                let set = sets[usize::try_from(roll % sets.len() as u64).unwrap_or(0)];
                let pick = (roll >> 32) % set.items.len() as u64;
                let def = &set.items[usize::try_from(pick).unwrap_or(0)];
                set.item(def, scale_u32(def.value, multiplier.max(1.0)))
            })
            .collect()
    };

    ProcessedRewards {
        energy: scale_u32(raw.energy, multiplier),
        treasure: scale_u32(raw.treasure, multiplier),
        items,
        shortcut_levels: raw.shortcut_levels,
    }
}

/// A permanent shortcut from `from_depth` spanning `levels` upward.
/// Returns `None` when the span would not climb at all.
#[must_use]
pub fn build_shortcut(from_depth: u32, levels: u32) -> Option<Shortcut> {
    let to_depth = from_depth.saturating_sub(levels.max(1));
    if levels == 0 || to_depth >= from_depth {
        return None;
    }
    Some(Shortcut {
        id: format!("shortcut-{from_depth}-{to_depth}"),
        from_depth,
        to_depth,
        energy_reduction: scale_u32(
            raw_cost_between(from_depth, to_depth),
            SHORTCUT_REDUCTION_RATIO,
        ),
        is_permanent: true,
    })
}
