//! Scoundrel: a solitaire dungeon crawl played with a trimmed card deck.
//!
//! Clubs and spades are monsters, diamonds are weapons, hearts are potions.
//! Rooms hold four cards; play three and the fourth carries into the next
//! room. Weapons degrade: once one slays a monster it can only be used on
//! monsters no stronger than the last one it slew.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{EncounterOutcome, OutcomeStatus, Progress, RawRewards};
use crate::constants::{
    SCOUNDREL_MAX_LIFE, SCOUNDREL_MAX_SKIPS, SCOUNDREL_ROOM_SIZE, SCOUNDREL_TIER_THREE_SCORE,
    SCOUNDREL_TIER_TWO_SCORE,
};
use crate::error::DelveError;
use crate::failure::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Spades,
    Diamonds,
    Hearts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    /// 2 to 10, then jack 11 through ace 14.
    pub value: u8,
}

impl Card {
    #[must_use]
    pub const fn new(suit: Suit, value: u8) -> Self {
        Self { suit, value }
    }

    #[must_use]
    pub const fn is_monster(self) -> bool {
        matches!(self.suit, Suit::Clubs | Suit::Spades)
    }

    #[must_use]
    pub const fn is_weapon(self) -> bool {
        matches!(self.suit, Suit::Diamonds)
    }

    #[must_use]
    pub const fn is_potion(self) -> bool {
        matches!(self.suit, Suit::Hearts)
    }
}

/// The 44-card deck: a standard deck without red face cards or red aces.
#[must_use]
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(44);
    for suit in [Suit::Clubs, Suit::Spades] {
        deck.extend((2..=14).map(|value| Card::new(suit, value)));
    }
    for suit in [Suit::Diamonds, Suit::Hearts] {
        deck.extend((2..=10).map(|value| Card::new(suit, value)));
    }
    deck
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "snake_case")]
pub enum ScoundrelMove {
    Play { index: usize, use_weapon: bool },
    SkipRoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Weapon {
    value: u8,
    last_slain: Option<u8>,
}

impl Weapon {
    fn can_strike(self, monster: u8) -> bool {
        self.last_slain.is_none_or(|last| monster <= last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoundrelState {
    pub depth: u32,
    pub life: u8,
    pub max_life: u8,
    pub room: Vec<Card>,
    pub deck_remaining: usize,
    pub weapon: Option<u8>,
    pub weapon_last_slain: Option<u8>,
    pub skips_remaining: u32,
    pub can_skip: bool,
    pub complete: bool,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoundrel {
    depth: u32,
    deck: VecDeque<Card>,
    room: Vec<Card>,
    life: u8,
    weapon: Option<Weapon>,
    potion_used: bool,
    played_in_room: usize,
    skips_used: u32,
    skipped_last_room: bool,
    last_played: Option<Card>,
    score: Option<i32>,
    outcome: Option<EncounterOutcome>,
}

impl Scoundrel {
    pub fn shuffled<R: Rng>(depth: u32, rng: &mut R) -> Self {
        let mut deck = standard_deck();
        deck.shuffle(rng);
        Self::from_deck(depth, deck)
    }

    /// Start a game on a fixed deck; the first card is the top.
    #[must_use]
    pub fn from_deck(depth: u32, deck: Vec<Card>) -> Self {
        let mut game = Self {
            depth,
            deck: deck.into(),
            room: Vec::with_capacity(SCOUNDREL_ROOM_SIZE),
            life: SCOUNDREL_MAX_LIFE,
            weapon: None,
            potion_used: false,
            played_in_room: 0,
            skips_used: 0,
            skipped_last_room: false,
            last_played: None,
            score: None,
            outcome: None,
        };
        game.fill_room();
        if game.room.is_empty() {
            game.finish_cleared();
        }
        game
    }

    #[must_use]
    pub const fn life(&self) -> u8 {
        self.life
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    fn can_skip(&self) -> bool {
        self.outcome.is_none()
            && self.skips_used < SCOUNDREL_MAX_SKIPS
            && !self.skipped_last_room
            && self.played_in_room == 0
    }

    #[must_use]
    pub fn state(&self) -> ScoundrelState {
        ScoundrelState {
            depth: self.depth,
            life: self.life,
            max_life: SCOUNDREL_MAX_LIFE,
            room: self.room.clone(),
            deck_remaining: self.deck.len(),
            weapon: self.weapon.map(|w| w.value),
            weapon_last_slain: self.weapon.and_then(|w| w.last_slain),
            skips_remaining: SCOUNDREL_MAX_SKIPS.saturating_sub(self.skips_used),
            can_skip: self.can_skip(),
            complete: self.outcome.is_some(),
            score: self.score,
        }
    }

    /// Apply one move.
    ///
    /// # Errors
    ///
    /// `EncounterAlreadyComplete`, `InvalidSelection` for a bad card index or
    /// a weapon strike without a weapon, `WeaponUnusable` when the weapon has
    /// degraded below the monster, `SkipUnavailable` when a skip is not allowed.
    pub fn play(&mut self, step: ScoundrelMove) -> Result<Progress, DelveError> {
        if self.outcome.is_some() {
            return Err(DelveError::EncounterAlreadyComplete);
        }
        match step {
            ScoundrelMove::SkipRoom => self.skip_room(),
            ScoundrelMove::Play { index, use_weapon } => self.play_card(index, use_weapon),
        }
    }

    fn skip_room(&mut self) -> Result<Progress, DelveError> {
        if !self.can_skip() {
            return Err(DelveError::SkipUnavailable);
        }
        self.deck.extend(self.room.drain(..));
        self.skips_used += 1;
        self.fill_room();
        self.skipped_last_room = true;
        log::debug!("scoundrel room skipped ({} of {SCOUNDREL_MAX_SKIPS})", self.skips_used);
        Ok(Progress::Ongoing)
    }

    fn play_card(&mut self, index: usize, use_weapon: bool) -> Result<Progress, DelveError> {
        let card = *self
            .room
            .get(index)
            .ok_or_else(|| DelveError::InvalidSelection(format!("room card {index}")))?;

        if card.is_monster() && use_weapon {
            let weapon = self
                .weapon
                .ok_or_else(|| DelveError::InvalidSelection(String::from("no weapon equipped")))?;
            if !weapon.can_strike(card.value) {
                return Err(DelveError::WeaponUnusable {
                    monster: card.value,
                });
            }
        }

        self.room.remove(index);
        self.played_in_room += 1;
        self.last_played = Some(card);

        match card.suit {
            Suit::Clubs | Suit::Spades => {
                let damage = match self.weapon.as_mut() {
                    Some(weapon) if use_weapon => {
                        weapon.last_slain = Some(card.value);
                        card.value.saturating_sub(weapon.value)
                    }
                    _ => card.value,
                };
                self.life = self.life.saturating_sub(damage);
            }
            Suit::Diamonds => {
                self.weapon = Some(Weapon {
                    value: card.value,
                    last_slain: None,
                });
            }
            Suit::Hearts => {
                if !self.potion_used {
                    self.life = self.life.saturating_add(card.value).min(SCOUNDREL_MAX_LIFE);
                    self.potion_used = true;
                }
            }
        }

        if self.life == 0 {
            self.finish_defeated();
            return Ok(Progress::Finished(OutcomeStatus::Failure));
        }
        if self.room.len() <= 1 && !self.deck.is_empty() {
            self.fill_room();
        }
        if self.room.is_empty() && self.deck.is_empty() {
            self.finish_cleared();
            return Ok(Progress::Finished(OutcomeStatus::Success));
        }
        Ok(Progress::Ongoing)
    }

    fn fill_room(&mut self) {
        while self.room.len() < SCOUNDREL_ROOM_SIZE {
            let Some(card) = self.deck.pop_front() else {
                break;
            };
            self.room.push(card);
        }
        self.potion_used = false;
        self.played_in_room = 0;
        self.skipped_last_room = false;
    }

    fn finish_defeated(&mut self) {
        let remaining: i32 = self
            .deck
            .iter()
            .chain(self.room.iter())
            .filter(|card| card.is_monster())
            .map(|card| i32::from(card.value))
            .sum();
        let score = i32::from(self.life) - remaining;
        self.score = Some(score);
        log::debug!("scoundrel lost with score {score}");
        self.outcome = Some(EncounterOutcome::failure(
            "scoundrel.defeated",
            FailureKind::CombatDefeat,
            0,
        ));
    }

    fn finish_cleared(&mut self) {
        let mut score = i32::from(self.life);
        if let Some(card) = self.last_played
            && card.is_potion()
            && self.life == SCOUNDREL_MAX_LIFE
        {
            score += i32::from(card.value);
        }
        self.score = Some(score);
        let tier = reward_tier(score);
        log::debug!("scoundrel cleared with score {score} (tier {tier})");
        self.outcome = Some(EncounterOutcome::success(
            format!("scoundrel.cleared.tier{tier}"),
            tier_reward(tier),
        ));
    }
}

/// Reward tier 1 to 3 for a winning score.
#[must_use]
pub const fn reward_tier(score: i32) -> u32 {
    if score >= SCOUNDREL_TIER_THREE_SCORE {
        3
    } else if score >= SCOUNDREL_TIER_TWO_SCORE {
        2
    } else {
        1
    }
}

const fn tier_reward(tier: u32) -> RawRewards {
    RawRewards {
        energy: 0,
        treasure: 30 * tier,
        items: tier - 1,
        shortcut_levels: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn c(value: u8) -> Card {
        Card::new(Suit::Clubs, value)
    }
    const fn d(value: u8) -> Card {
        Card::new(Suit::Diamonds, value)
    }
    const fn h(value: u8) -> Card {
        Card::new(Suit::Hearts, value)
    }

    fn play(game: &mut Scoundrel, index: usize, use_weapon: bool) -> Progress {
        game.play(ScoundrelMove::Play { index, use_weapon }).unwrap()
    }

    #[test]
    fn deck_has_forty_four_cards_without_red_royals() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 44);
        assert!(
            deck.iter()
                .filter(|card| !card.is_monster())
                .all(|card| card.value <= 10)
        );
        assert_eq!(deck.iter().filter(|card| card.is_monster()).count(), 26);
    }

    #[test]
    fn weapons_soften_blows_and_degrade() {
        let mut game = Scoundrel::from_deck(1, vec![d(5), c(8), c(10), c(3), c(2)]);
        play(&mut game, 0, false);
        play(&mut game, 0, true);
        assert_eq!(game.life(), 17);
        let err = game
            .play(ScoundrelMove::Play {
                index: 0,
                use_weapon: true,
            })
            .unwrap_err();
        assert_eq!(err, DelveError::WeaponUnusable { monster: 10 });
        play(&mut game, 0, false);
        assert_eq!(game.life(), 7);
        assert_eq!(game.state().weapon_last_slain, Some(8));
    }

    #[test]
    fn only_first_potion_in_a_room_heals() {
        let mut game = Scoundrel::from_deck(1, vec![c(9), h(5), h(6), c(2), c(2)]);
        play(&mut game, 0, false);
        play(&mut game, 0, false);
        play(&mut game, 0, false);
        assert_eq!(game.life(), 16);
    }

    #[test]
    fn skips_are_limited_and_never_consecutive() {
        let deck: Vec<Card> = (2..=13).map(c).collect();
        let mut game = Scoundrel::from_deck(1, deck);
        let first_room = game.state().room;
        game.play(ScoundrelMove::SkipRoom).unwrap();
        assert_eq!(game.play(ScoundrelMove::SkipRoom), Err(DelveError::SkipUnavailable));
        assert_eq!(game.state().deck_remaining, 8);
        assert_eq!(&game.deck.iter().copied().collect::<Vec<_>>()[4..], &first_room[..]);
        play(&mut game, 0, false);
        assert!(!game.state().can_skip);
    }

    #[test]
    fn dying_fails_with_negative_score() {
        let mut game = Scoundrel::from_deck(1, vec![c(14), c(14), c(5), c(3)]);
        play(&mut game, 0, false);
        assert_eq!(play(&mut game, 0, false), Progress::Finished(OutcomeStatus::Failure));
        let state = game.state();
        assert_eq!(state.score, Some(-8));
        assert_eq!(
            game.outcome().unwrap().failure_kind(),
            Some(FailureKind::CombatDefeat)
        );
        assert_eq!(
            game.play(ScoundrelMove::SkipRoom),
            Err(DelveError::EncounterAlreadyComplete)
        );
    }

    #[test]
    fn clearing_at_full_life_with_a_potion_scores_bonus() {
        let mut game = Scoundrel::from_deck(1, vec![d(4), c(2), h(3), h(7)]);
        play(&mut game, 0, false);
        play(&mut game, 0, true);
        play(&mut game, 0, false);
        assert_eq!(game.life(), 20);
        assert_eq!(play(&mut game, 0, false), Progress::Finished(OutcomeStatus::Success));
        assert_eq!(game.state().score, Some(27));
        let reward = game.outcome().unwrap().reward.unwrap();
        assert_eq!(reward.treasure, 90);
        assert_eq!(reward.items, 2);
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(reward_tier(-3), 1);
        assert_eq!(reward_tier(8), 2);
        assert_eq!(reward_tier(15), 3);
    }
}
