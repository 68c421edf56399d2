//! Default collaborator implementations operating directly on [`Game`].

use tracing::{debug, warn};

use crate::conditions::evaluate_number;
use crate::error::ConditionError;
use crate::game::{Character, Game, GameState, LootDeck, MonsterEntity, MonsterGroup, Objective};
use crate::model::{
    CharacterData, EditionData, EntityValue, LootDeckConfig, MonsterType, ObjectiveDefinition,
};
use crate::ports::{
    CharacterRegistry, LevelManager, LootRegistry, MonsterRegistry, RoundManager, ValueEvaluator,
};

/// Gold per loot token, by scenario level 0..=7.
const LOOT_BY_LEVEL: [u32; 8] = [2, 2, 3, 3, 4, 4, 5, 6];

/// Stateless implementation of every game-state port.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

pub(crate) static STANDARD: Standard = Standard;

impl RoundManager for Standard {
    fn reset_scenario(&self, game: &mut Game) {
        game.round = 0;
        game.state = GameState::Draw;
        game.monsters.clear();
        game.objectives.clear();
        game.scenario_rules.clear();
        for character in &mut game.characters {
            character.experience = 0;
            character.loot = 0;
        }
    }
}

impl MonsterRegistry for Standard {
    fn add_monster_by_name(
        &self,
        game: &mut Game,
        name: &str,
        is_ally: bool,
        edition: &EditionData,
    ) -> Option<usize> {
        if let Some(pos) = game
            .monsters
            .iter()
            .position(|group| group.name == name && group.edition == edition.edition)
        {
            return Some(pos);
        }
        let Some(data) = edition.monster(name) else {
            warn!(monster = name, edition = %edition.edition, "unknown monster");
            return None;
        };
        debug!(monster = name, is_ally, "adding monster group");
        game.monsters.push(MonsterGroup::new(data, is_ally));
        Some(game.monsters.len() - 1)
    }

    fn entity_count(&self, group: &MonsterGroup) -> usize {
        group.living()
    }

    fn add_entity(&self, group: &mut MonsterGroup, number: i32, kind: MonsterType) {
        debug!(monster = %group.name, number, ?kind, "adding standee");
        group.entities.push(MonsterEntity {
            number,
            kind,
            dead: false,
        });
    }
}

impl CharacterRegistry for Standard {
    fn add_xp(&self, character: &mut Character, amount: u32) {
        character.progress.experience += amount;
    }

    fn add_objective(
        &self,
        game: &mut Game,
        objective: &ObjectiveDefinition,
        display_name: Option<String>,
    ) {
        let max_health = match self.evaluate(game, &objective.health) {
            Ok(health) => health.max(1),
            Err(err) => {
                warn!(objective = %objective.name, %err, "cannot resolve objective health");
                1
            }
        };
        game.objectives.push(Objective {
            name: objective.name.clone(),
            display_name,
            max_health,
            escort: objective.escort,
        });
    }

    fn add_character(&self, game: &mut Game, data: &CharacterData, level: u32) {
        debug!(character = %data.name, level, "adding character");
        game.characters.push(Character::new(data, level));
    }
}

impl LootRegistry for Standard {
    fn apply(&self, deck: &mut LootDeck, config: &LootDeckConfig) {
        deck.cards = config
            .0
            .iter()
            .flat_map(|(kind, count)| std::iter::repeat(*kind).take(*count as usize))
            .collect();
        deck.config = Some(config.clone());
    }
}

impl LevelManager for Standard {
    fn experience(&self, game: &Game) -> u32 {
        4 + 2 * game.level
    }

    fn loot(&self, game: &Game) -> u32 {
        LOOT_BY_LEVEL[(game.level as usize).min(LOOT_BY_LEVEL.len() - 1)]
    }
}

impl ValueEvaluator for Standard {
    fn evaluate(&self, game: &Game, value: &EntityValue) -> Result<i64, ConditionError> {
        match value {
            EntityValue::Number(n) => Ok(*n),
            EntityValue::Expression(src) => evaluate_number(src, &game.value_bindings()),
        }
    }
}
