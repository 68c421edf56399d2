//! Static scenario content and campaign records.
//!
//! Everything here is plain data: definitions are loaded once per edition
//! and never mutated by the engine; records are what a party's campaign
//! history persists.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::conditions::RoundCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterType {
    Normal,
    Elite,
    Boss,
}

/// Anything addressable by `(index, edition, group)` within the catalogue.
pub trait ScenarioKey {
    fn index(&self) -> &str;
    fn edition(&self) -> &str;
    fn group(&self) -> Option<&str>;

    fn same_scenario<K: ScenarioKey + ?Sized>(&self, other: &K) -> bool {
        self.index() == other.index()
            && self.edition() == other.edition()
            && self.group() == other.group()
    }
}

/// Identifies a scenario or custom entry within an edition/group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioIdentifier {
    pub index: String,
    pub edition: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub custom: bool,
}

impl ScenarioIdentifier {
    pub fn new(index: impl Into<String>, edition: impl Into<String>, group: Option<&str>) -> Self {
        Self {
            index: index.into(),
            edition: edition.into(),
            group: group.map(str::to_string),
            custom: false,
        }
    }
}

impl ScenarioKey for ScenarioIdentifier {
    fn index(&self) -> &str {
        &self.index
    }
    fn edition(&self) -> &str {
        &self.edition
    }
    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

/// A numeric amount that may depend on live game values (`"C+1"`, `"2*L"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Number(i64),
    Expression(String),
}

impl Default for EntityValue {
    /// A single entity.
    fn default() -> Self {
        EntityValue::Number(1)
    }
}

/// Monster placed when a room is revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandeePlacement {
    pub name: String,
    /// Explicit type; wins over the per-player-count table.
    #[serde(default, rename = "type")]
    pub kind: Option<MonsterType>,
    #[serde(default)]
    pub player2: Option<MonsterType>,
    #[serde(default)]
    pub player3: Option<MonsterType>,
    #[serde(default)]
    pub player4: Option<MonsterType>,
}

impl StandeePlacement {
    pub fn resolve_type(&self, present_characters: usize) -> Option<MonsterType> {
        self.kind.or(match present_characters {
            0..=2 => self.player2,
            3 => self.player3,
            _ => self.player4,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub room_number: u32,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub monsters: Vec<StandeePlacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub name: String,
    #[serde(default)]
    pub count: EntityValue,
    #[serde(default)]
    pub health: EntityValue,
    #[serde(default)]
    pub escort: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootType {
    Money,
    Lumber,
    Metal,
    Hide,
    Arrowvine,
    Axenut,
    Corpsecap,
    Flamefruit,
    Rockroot,
    Snowthistle,
    RandomItem,
}

/// Card counts per loot type, in deck-building order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootDeckConfig(pub IndexMap<LootType, u32>);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioRule {
    #[serde(default)]
    pub round: RoundCondition,
    /// Fires at round start (draw) instead of on advancing to the next round.
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub note: Option<String>,
}

/// Immutable content of a scenario or section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDefinition {
    pub index: String,
    pub name: String,
    pub edition: String,
    pub group: Option<String>,
    pub initial: bool,
    pub solo: Option<String>,
    pub rooms: Vec<RoomDefinition>,
    pub monsters: Vec<String>,
    pub allies: Vec<String>,
    pub objectives: Vec<ObjectiveDefinition>,
    pub loot_deck_config: Option<LootDeckConfig>,
    pub unlocks: Vec<String>,
    pub blocks: Vec<String>,
    /// Disjunction of conjunctions of prerequisite scenario indices.
    pub requires: Vec<Vec<String>>,
    pub rules: Vec<ScenarioRule>,
    pub custom: bool,
}

impl ScenarioDefinition {
    /// Blank definition standing in for a custom (free-text) scenario.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom: true,
            ..Self::default()
        }
    }

    pub fn is_ally(&self, monster: &str) -> bool {
        self.allies.iter().any(|ally| ally == monster)
    }

    pub fn room(&self, room_number: u32) -> Option<&RoomDefinition> {
        self.rooms.iter().find(|room| room.room_number == room_number)
    }

    pub fn identifier(&self) -> ScenarioIdentifier {
        ScenarioIdentifier {
            index: self.index.clone(),
            edition: self.edition.clone(),
            group: self.group.clone(),
            custom: self.custom,
        }
    }
}

impl ScenarioKey for ScenarioDefinition {
    fn index(&self) -> &str {
        &self.index
    }
    fn edition(&self) -> &str {
        &self.edition
    }
    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterData {
    pub name: String,
    #[serde(default)]
    pub edition: String,
    /// Number of physical standees available.
    pub count: u32,
    #[serde(default)]
    pub boss: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    pub name: String,
    #[serde(default)]
    pub edition: String,
}

/// All static content of one edition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditionData {
    pub edition: String,
    pub scenarios: Vec<ScenarioDefinition>,
    pub sections: Vec<ScenarioDefinition>,
    pub monsters: Vec<MonsterData>,
    pub characters: Vec<CharacterData>,
}

impl EditionData {
    /// Stamp this edition's code onto nested entries that omit it.
    pub fn normalized(mut self) -> Self {
        let code = self.edition.clone();
        let scenarios = self.scenarios.iter_mut().chain(self.sections.iter_mut());
        for scenario in scenarios.filter(|s| s.edition.is_empty()) {
            scenario.edition = code.clone();
        }
        for monster in self.monsters.iter_mut().filter(|m| m.edition.is_empty()) {
            monster.edition = code.clone();
        }
        for character in self.characters.iter_mut().filter(|c| c.edition.is_empty()) {
            character.edition = code.clone();
        }
        self
    }

    pub fn monster(&self, name: &str) -> Option<&MonsterData> {
        self.monsters.iter().find(|monster| monster.name == name)
    }
}

/// Persisted entry of campaign history (completed or manually unlocked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub index: String,
    pub edition: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub custom_name: String,
    #[serde(default)]
    pub revealed_rooms: Vec<u32>,
}

impl ScenarioRecord {
    pub fn from_definition(
        definition: &ScenarioDefinition,
        revealed_rooms: &[u32],
        custom: bool,
        custom_name: impl Into<String>,
    ) -> Self {
        Self {
            index: definition.index.clone(),
            edition: definition.edition.clone(),
            group: definition.group.clone(),
            custom,
            custom_name: custom_name.into(),
            revealed_rooms: revealed_rooms.to_vec(),
        }
    }
}

impl ScenarioKey for ScenarioRecord {
    fn index(&self) -> &str {
        &self.index
    }
    fn edition(&self) -> &str {
        &self.edition
    }
    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

/// A party's campaign progress.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignProgress {
    pub campaign_mode: bool,
    /// Completed scenarios, in completion order.
    pub scenarios: Vec<ScenarioRecord>,
    /// Scenarios unlocked by hand, bypassing the unlock graph.
    pub manual_scenarios: Vec<ScenarioRecord>,
}

impl CampaignProgress {
    pub fn has_completed<K: ScenarioKey + ?Sized>(&self, scenario: &K) -> bool {
        self.scenarios.iter().any(|record| record.same_scenario(scenario))
    }

    pub fn is_manually_unlocked<K: ScenarioKey + ?Sized>(&self, scenario: &K) -> bool {
        self.manual_scenarios
            .iter()
            .any(|record| record.same_scenario(scenario))
    }

    /// Append a completion and drop the matching manual unlock, if any.
    pub fn record_completion(&mut self, record: ScenarioRecord) {
        self.manual_scenarios
            .retain(|manual| !manual.same_scenario(&record));
        self.scenarios.push(record);
    }
}
