//! Rest sites: the only place energy comes back mid-run.

use super::{ChoiceEncounter, EncounterKind, PathChoice, RawRewards};
use crate::failure::FailureKind;

const fn rest_energy(depth: u32) -> u32 {
    150 + depth * 15
}

#[must_use]
pub fn rest_site(depth: u32) -> ChoiceEncounter {
    let paths = vec![
        PathChoice::new("rest", "Make camp", 1.0, FailureKind::RestDisturbed).reward(
            RawRewards {
                energy: rest_energy(depth),
                ..RawRewards::default()
            },
        ),
        PathChoice::new("meditate", "Meditate", 0.9, FailureKind::RestDisturbed)
            .modifiers(0.0, 1.3)
            .reward(RawRewards {
                energy: rest_energy(depth) / 2,
                ..RawRewards::default()
            }),
        PathChoice::new("forage", "Forage nearby", 0.75, FailureKind::RestDisturbed)
            .reward(RawRewards {
                energy: 40,
                treasure: 15,
                items: 1,
                ..RawRewards::default()
            })
            .failure_loss(10),
    ];
    ChoiceEncounter::new(EncounterKind::RestSite, depth, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn making_camp_restores_depth_scaled_energy() {
        let mut site = rest_site(4);
        site.select_path("rest").unwrap();
        site.resolve_with_roll(0.99).unwrap();
        assert_eq!(site.outcome().unwrap().reward.unwrap().energy, 210);
    }

    #[test]
    fn failed_meditation_costs_no_energy() {
        let mut site = rest_site(2);
        site.select_path("meditate").unwrap();
        site.resolve_with_roll(0.95).unwrap();
        let outcome = site.outcome().unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.consequence.unwrap().energy_loss, 0);
    }
}
