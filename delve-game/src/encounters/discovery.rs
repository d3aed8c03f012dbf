//! Discovery sites: loot, relics and the occasional shortcut back up.

use super::{ChoiceEncounter, EncounterKind, PathChoice, RawRewards};
use crate::failure::FailureKind;

/// Deeper sites chart longer shortcuts.
const fn charted_levels(depth: u32) -> u32 {
    1 + depth / 6
}

#[must_use]
pub fn discovery_site(depth: u32) -> ChoiceEncounter {
    let paths = vec![
        PathChoice::new("search", "Search the alcoves", 0.8, FailureKind::CaveIn).reward(
            RawRewards {
                treasure: 30,
                items: 1,
                ..RawRewards::default()
            },
        ),
        PathChoice::new("excavate", "Dig into the rubble", 0.6, FailureKind::CaveIn)
            .modifiers(-0.05, 1.6)
            .reward(RawRewards {
                treasure: 50,
                items: 2,
                ..RawRewards::default()
            })
            .failure_loss(40),
        PathChoice::new(
            "chart_passage",
            "Chart the side passage",
            0.65,
            FailureKind::CaveIn,
        )
        .reward(RawRewards {
            treasure: 10,
            shortcut_levels: charted_levels(depth),
            ..RawRewards::default()
        })
        .failure_loss(20),
    ];
    ChoiceEncounter::new(EncounterKind::DiscoverySite, depth, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charting_finds_a_shortcut() {
        let mut site = discovery_site(7);
        site.select_path("chart_passage").unwrap();
        site.resolve_with_roll(0.0).unwrap();
        let reward = site.outcome().unwrap().reward.unwrap();
        assert_eq!(reward.shortcut_levels, 2);
    }

    #[test]
    fn odds_do_not_depend_on_depth() {
        let shallow = discovery_site(1).state();
        let deep = discovery_site(15).state();
        assert_eq!(shallow.paths[0].success_chance, deep.paths[0].success_chance);
        assert_eq!(shallow.paths.len(), 3);
    }
}
