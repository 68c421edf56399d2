//! Narrow collaborator interfaces the scenario engine drives.
//!
//! Implementations mutate the [`Game`] handed to them; none of them holds on
//! to it. [`crate::standard::Standard`] implements every port except the
//! edition repository.

use crate::error::ConditionError;
use crate::game::{Character, Game, LootDeck, MonsterGroup};
use crate::model::{
    CharacterData, EditionData, EntityValue, LootDeckConfig, MonsterType, ObjectiveDefinition,
    ScenarioDefinition,
};

/// Read-only access to the static content of every loaded edition.
pub trait EditionRepository {
    fn editions(&self) -> &[EditionData];

    fn edition(&self, code: &str) -> Option<&EditionData> {
        self.editions().iter().find(|data| data.edition == code)
    }

    fn find_scenario(
        &self,
        index: &str,
        edition: &str,
        group: Option<&str>,
    ) -> Option<&ScenarioDefinition> {
        self.edition(edition)?
            .scenarios
            .iter()
            .find(|s| s.index == index && s.group.as_deref() == group)
    }

    fn find_section(
        &self,
        index: &str,
        edition: &str,
        group: Option<&str>,
    ) -> Option<&ScenarioDefinition> {
        self.edition(edition)?
            .sections
            .iter()
            .find(|s| s.index == index && s.group.as_deref() == group)
    }

    fn find_character(&self, name: &str, edition: &str) -> Option<&CharacterData> {
        self.edition(edition)?
            .characters
            .iter()
            .find(|c| c.name == name)
    }
}

pub trait RoundManager {
    /// Clear round counter and turn state for a fresh (or no) scenario.
    fn reset_scenario(&self, game: &mut Game);
}

pub trait MonsterRegistry {
    /// Find or add the group for `name`; returns its position in `game.monsters`.
    fn add_monster_by_name(
        &self,
        game: &mut Game,
        name: &str,
        is_ally: bool,
        edition: &EditionData,
    ) -> Option<usize>;

    /// Standees of the group currently in play.
    fn entity_count(&self, group: &MonsterGroup) -> usize;

    fn add_entity(&self, group: &mut MonsterGroup, number: i32, kind: MonsterType);
}

pub trait CharacterRegistry {
    fn add_xp(&self, character: &mut Character, amount: u32);

    fn add_objective(
        &self,
        game: &mut Game,
        objective: &ObjectiveDefinition,
        display_name: Option<String>,
    );

    fn add_character(&self, game: &mut Game, data: &CharacterData, level: u32);
}

pub trait LootRegistry {
    fn apply(&self, deck: &mut LootDeck, config: &LootDeckConfig);
}

/// Scenario rewards for the current level.
pub trait LevelManager {
    /// Bonus experience for completing the scenario.
    fn experience(&self, game: &Game) -> u32;
    /// Gold per loot token.
    fn loot(&self, game: &Game) -> u32;
}

/// Resolves amounts that may reference live game values.
pub trait ValueEvaluator {
    fn evaluate(&self, game: &Game, value: &EntityValue) -> Result<i64, ConditionError>;
}
