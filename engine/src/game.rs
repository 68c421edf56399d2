//! Live, mutable game state the scenario engine reads and writes.
//!
//! The caller owns a [`Game`] and hands it to each engine operation; the
//! engine never keeps a reference to it between calls.

use serde::{Deserialize, Serialize};

use crate::conditions::Bindings;
use crate::model::{
    CampaignProgress, CharacterData, LootDeckConfig, LootType, MonsterData, MonsterType,
    ScenarioDefinition, ScenarioKey,
};

/// Round phase the rule evaluator keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Round begin: ability cards are being drawn.
    #[default]
    Draw,
    /// Round in play; advancing moves to the next round.
    Next,
}

/// Whether a scenario is currently being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioPhase {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterProgress {
    pub experience: u32,
    pub gold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub edition: String,
    pub level: u32,
    /// Sitting this scenario out (e.g. locked out by a solo scenario).
    #[serde(default)]
    pub absent: bool,
    /// Experience accrued during the current scenario.
    #[serde(default)]
    pub experience: u32,
    /// Loot tokens picked up during the current scenario.
    #[serde(default)]
    pub loot: u32,
    #[serde(default)]
    pub progress: CharacterProgress,
}

impl Character {
    pub fn new(data: &CharacterData, level: u32) -> Self {
        Self {
            name: data.name.clone(),
            edition: data.edition.clone(),
            level,
            absent: false,
            experience: 0,
            loot: 0,
            progress: CharacterProgress::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterEntity {
    /// Standee number; negative numbers were assigned automatically.
    pub number: i32,
    #[serde(rename = "type")]
    pub kind: MonsterType,
    #[serde(default)]
    pub dead: bool,
}

/// All standees of one monster type in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterGroup {
    pub name: String,
    pub edition: String,
    /// Standee capacity.
    pub count: u32,
    #[serde(default)]
    pub boss: bool,
    #[serde(default)]
    pub is_ally: bool,
    #[serde(default)]
    pub entities: Vec<MonsterEntity>,
}

impl MonsterGroup {
    pub fn new(data: &MonsterData, is_ally: bool) -> Self {
        Self {
            name: data.name.clone(),
            edition: data.edition.clone(),
            count: data.count,
            boss: data.boss,
            is_ally,
            entities: Vec::new(),
        }
    }

    pub fn has_number(&self, number: i32) -> bool {
        self.entities.iter().any(|entity| entity.number == number)
    }

    pub fn living(&self) -> usize {
        self.entities.iter().filter(|entity| !entity.dead).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub max_health: i64,
    #[serde(default)]
    pub escort: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LootDeck {
    pub cards: Vec<LootType>,
    #[serde(default)]
    pub config: Option<LootDeckConfig>,
}

/// The scenario (or section) being played and its revealed rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveScenario {
    pub definition: ScenarioDefinition,
    /// Append-only; the same room may appear more than once.
    #[serde(default)]
    pub revealed_rooms: Vec<u32>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub custom_name: String,
}

impl LiveScenario {
    pub fn new(definition: ScenarioDefinition, revealed_rooms: Vec<u32>) -> Self {
        Self {
            definition,
            revealed_rooms,
            custom: false,
            custom_name: String::new(),
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            definition: ScenarioDefinition::custom(name.clone()),
            revealed_rooms: Vec::new(),
            custom: true,
            custom_name: name,
        }
    }
}

impl ScenarioKey for LiveScenario {
    fn index(&self) -> &str {
        &self.definition.index
    }
    fn edition(&self) -> &str {
        &self.definition.edition
    }
    fn group(&self) -> Option<&str> {
        self.definition.group.as_deref()
    }
}

/// A scenario rule whose condition currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    pub edition: String,
    pub scenario: String,
    pub group: Option<String>,
    /// 1-based position in the owning scenario's rule list.
    pub index: usize,
    pub section: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub level: u32,
    pub round: u32,
    pub state: GameState,
    pub characters: Vec<Character>,
    pub monsters: Vec<MonsterGroup>,
    pub objectives: Vec<Objective>,
    pub scenario: Option<LiveScenario>,
    pub sections: Vec<LiveScenario>,
    pub scenario_rules: Vec<TriggeredRule>,
    pub party: Option<CampaignProgress>,
    pub loot_deck: LootDeck,
}

impl Game {
    pub fn present_characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|character| !character.absent)
    }

    pub fn present_character_count(&self) -> usize {
        self.present_characters().count()
    }

    pub fn phase(&self) -> ScenarioPhase {
        if self.scenario.is_some() {
            ScenarioPhase::Active
        } else {
            ScenarioPhase::Idle
        }
    }

    pub fn monster(&self, name: &str) -> Option<&MonsterGroup> {
        self.monsters.iter().find(|group| group.name == name)
    }

    /// Values for `R`, `C` and `L` in objective/value expressions.
    pub fn value_bindings(&self) -> Bindings {
        Bindings {
            round: Some(self.round),
            characters: Some(self.present_character_count()),
            level: Some(self.level),
        }
    }
}
