//! Scenario lifecycle: select, set up, play, finish.
//!
//! [`ScenarioManager`] holds the collaborator ports it drives; the game
//! itself is passed into every call by its owner.

use tracing::{debug, error, info, warn};

use crate::StandeeDice;
use crate::error::ScenarioError;
use crate::game::{Game, LiveScenario, ScenarioPhase};
use crate::model::{EditionData, RoomDefinition, ScenarioDefinition, ScenarioKey, ScenarioRecord};
use crate::ports::{
    CharacterRegistry, EditionRepository, LevelManager, LootRegistry, MonsterRegistry,
    RoundManager, ValueEvaluator,
};
use crate::settings::Settings;
use crate::standard::STANDARD;
use crate::{progression, rules, setup};

/// The collaborators a [`ScenarioManager`] works through.
#[derive(Clone, Copy)]
pub struct ScenarioContext<'c> {
    pub catalogue: &'c dyn EditionRepository,
    pub settings: &'c Settings,
    pub rounds: &'c dyn RoundManager,
    pub monsters: &'c dyn MonsterRegistry,
    pub characters: &'c dyn CharacterRegistry,
    pub loot: &'c dyn LootRegistry,
    pub levels: &'c dyn LevelManager,
    pub values: &'c dyn ValueEvaluator,
}

impl<'c> ScenarioContext<'c> {
    /// Use [`crate::Standard`] for every game-state port.
    pub fn standard(catalogue: &'c dyn EditionRepository, settings: &'c Settings) -> Self {
        Self {
            catalogue,
            settings,
            rounds: &STANDARD,
            monsters: &STANDARD,
            characters: &STANDARD,
            loot: &STANDARD,
            levels: &STANDARD,
            values: &STANDARD,
        }
    }
}

pub struct ScenarioManager<'c> {
    ctx: ScenarioContext<'c>,
    dice: StandeeDice,
}

impl<'c> ScenarioManager<'c> {
    pub fn new(ctx: ScenarioContext<'c>) -> Self {
        Self::with_dice(ctx, StandeeDice::from_entropy())
    }

    pub fn with_dice(ctx: ScenarioContext<'c>, dice: StandeeDice) -> Self {
        Self { ctx, dice }
    }

    pub fn context(&self) -> &ScenarioContext<'c> {
        &self.ctx
    }

    pub fn phase(&self, game: &Game) -> ScenarioPhase {
        game.phase()
    }

    /// Make `scenario` the active one (or clear it with `None`).
    ///
    /// Catalogue scenarios get a round reset and their setup applied. A
    /// custom scenario is stored as-is. On a lookup failure nothing changes;
    /// scenarios of editions not enabled in settings count as missing.
    pub fn set_scenario(
        &mut self,
        game: &mut Game,
        scenario: Option<LiveScenario>,
    ) -> Result<(), ScenarioError> {
        let Some(scenario) = scenario else {
            debug!("clearing scenario");
            game.scenario = None;
            self.ctx.rounds.reset_scenario(game);
            return Ok(());
        };

        if scenario.custom {
            debug!(name = %scenario.custom_name, "selecting custom scenario");
            game.scenario = Some(scenario);
            return Ok(());
        }

        let (edition, definition) = self
            .resolve(&scenario)
            .inspect_err(|err| error!(%err, "cannot select scenario"))?;

        info!(
            edition = %definition.edition,
            index = %definition.index,
            name = %definition.name,
            "selecting scenario"
        );
        game.scenario = Some(scenario);
        self.ctx.rounds.reset_scenario(game);
        setup::apply_scenario_data(&self.ctx, &mut self.dice, game, edition, definition);
        Ok(())
    }

    /// Select a catalogue scenario with nothing revealed yet.
    pub fn select(
        &mut self,
        game: &mut Game,
        definition: &ScenarioDefinition,
    ) -> Result<(), ScenarioError> {
        self.set_scenario(game, Some(LiveScenario::new(definition.clone(), Vec::new())))
    }

    /// Pay out experience and gold, record a success in the party's
    /// history, then return to no scenario.
    pub fn finish_scenario(&mut self, game: &mut Game, success: bool) {
        let bonus = if success {
            self.ctx.levels.experience(game)
        } else {
            0
        };
        let gold_per_loot = self.ctx.levels.loot(game);

        for character in game.characters.iter_mut().filter(|c| !c.absent) {
            let experience = bonus + character.experience;
            self.ctx.characters.add_xp(character, experience);
            character.progress.gold += character.loot * gold_per_loot;
        }

        if success {
            if let (Some(party), Some(scenario)) = (game.party.as_mut(), game.scenario.as_ref()) {
                let custom_name = if scenario.custom {
                    scenario.custom_name.clone()
                } else {
                    String::new()
                };
                info!(index = %scenario.definition.index, "scenario completed");
                party.record_completion(ScenarioRecord::from_definition(
                    &scenario.definition,
                    &scenario.revealed_rooms,
                    scenario.custom,
                    custom_name,
                ));
            }
        }

        game.scenario = None;
        game.sections.clear();
        self.ctx.rounds.reset_scenario(game);

        for character in &mut game.characters {
            character.absent = false;
        }
    }

    /// Activate a section and apply its setup; already active sections are left alone.
    pub fn add_section(
        &mut self,
        game: &mut Game,
        section: &ScenarioDefinition,
    ) -> Result<(), ScenarioError> {
        let edition = self
            .edition(&section.edition)
            .inspect_err(|err| error!(%err, "cannot add section"))?;

        if game.sections.iter().any(|active| active.same_scenario(section)) {
            debug!(index = %section.index, "section already active");
            return Ok(());
        }

        game.sections
            .push(LiveScenario::new(section.clone(), Vec::new()));
        setup::apply_scenario_data(&self.ctx, &mut self.dice, game, edition, section);
        Ok(())
    }

    /// Activate the catalogue section named by `key`.
    pub fn add_section_by_key<K: ScenarioKey>(
        &mut self,
        game: &mut Game,
        key: &K,
    ) -> Result<(), ScenarioError> {
        let catalogue = self.ctx.catalogue;
        let section = catalogue
            .find_section(key.index(), key.edition(), key.group())
            .filter(|section| self.enabled(&section.edition))
            .ok_or_else(|| ScenarioError::SectionNotFound {
                index: key.index().to_string(),
                edition: key.edition().to_string(),
                group: key.group().map(str::to_string),
            })
            .inspect_err(|err| error!(%err, "cannot add section"))?;
        self.add_section(game, section)
    }

    pub fn apply_scenario_data(
        &mut self,
        game: &mut Game,
        edition: &EditionData,
        definition: &ScenarioDefinition,
    ) {
        setup::apply_scenario_data(&self.ctx, &mut self.dice, game, edition, definition);
    }

    pub fn open_door(
        &mut self,
        game: &mut Game,
        room: &RoomDefinition,
        edition: &EditionData,
        definition: &ScenarioDefinition,
    ) {
        setup::open_door(&self.ctx, &mut self.dice, game, room, edition, definition);
    }

    /// Open a room of the active scenario or one of its sections by number.
    ///
    /// A room already revealed is recorded again but places nothing.
    pub fn open_room(&mut self, game: &mut Game, room_number: u32) -> Result<(), ScenarioError> {
        let not_found = ScenarioError::RoomNotFound { room: room_number };
        let definition = game
            .scenario
            .iter()
            .chain(game.sections.iter())
            .map(|live| &live.definition)
            .find(|definition| definition.room(room_number).is_some())
            .cloned()
            .ok_or_else(|| not_found.clone())
            .inspect_err(|err| warn!(%err, "cannot open door"))?;
        let edition = self
            .edition(&definition.edition)
            .inspect_err(|err| error!(%err, "cannot open door"))?;
        let room = definition.room(room_number).ok_or(not_found)?;
        if let Some(scenario) = game
            .scenario
            .as_mut()
            .filter(|scenario| scenario.revealed_rooms.contains(&room_number))
        {
            debug!(room = room_number, "room already revealed");
            scenario.revealed_rooms.push(room_number);
            return Ok(());
        }
        setup::open_door(&self.ctx, &mut self.dice, game, room, edition, &definition);
        Ok(())
    }

    pub fn scenario_data(&self, game: &Game, edition: Option<&str>) -> Vec<&'c ScenarioDefinition> {
        progression::selectable_scenarios(
            self.ctx.catalogue,
            self.ctx.settings,
            game.party.as_ref(),
            edition,
        )
    }

    pub fn is_blocked(&self, game: &Game, definition: &ScenarioDefinition) -> bool {
        progression::is_blocked(self.ctx.catalogue, game.party.as_ref(), definition)
    }

    /// Recompute `game.scenario_rules` for the current round state.
    pub fn apply_scenario_rules(&self, game: &mut Game) {
        game.scenario_rules = rules::triggered_rules(game);
    }

    /// `[index, name key, edition key]` identifying a scenario in undo entries.
    pub fn scenario_undo_args(&self, game: &Game, scenario: Option<&LiveScenario>) -> [String; 3] {
        let Some(scenario) = scenario.or(game.scenario.as_ref()) else {
            return Default::default();
        };
        let source = if scenario.custom {
            "scenario.custom".to_string()
        } else {
            format!("data.edition.{}", scenario.definition.edition)
        };
        [
            scenario.definition.index.clone(),
            format!("data.scenario.{}", scenario.definition.name),
            source,
        ]
    }

    /// Definition behind a history record, copied out of the catalogue.
    pub fn scenario_data_for_model(&self, model: &ScenarioRecord) -> Option<ScenarioDefinition> {
        if model.custom {
            return Some(ScenarioDefinition::custom(model.custom_name.clone()));
        }
        let found = self
            .ctx
            .catalogue
            .find_scenario(&model.index, &model.edition, model.group.as_deref())
            .filter(|definition| self.enabled(&definition.edition));
        if found.is_none() {
            warn!(?model, "invalid scenario data");
        }
        found.cloned()
    }

    pub fn section_data_for_model(&self, model: &ScenarioRecord) -> Option<ScenarioDefinition> {
        let found = self
            .ctx
            .catalogue
            .find_section(&model.index, &model.edition, model.group.as_deref())
            .filter(|definition| self.enabled(&definition.edition));
        if found.is_none() {
            warn!(?model, "invalid section data");
        }
        found.cloned()
    }

    pub fn to_model(
        &self,
        definition: &ScenarioDefinition,
        revealed_rooms: &[u32],
        custom: bool,
        custom_name: &str,
    ) -> ScenarioRecord {
        ScenarioRecord::from_definition(definition, revealed_rooms, custom, custom_name)
    }

    fn enabled(&self, edition: &str) -> bool {
        self.ctx.settings.edition_enabled(edition)
    }

    fn edition(&self, code: &str) -> Result<&'c EditionData, ScenarioError> {
        let catalogue = self.ctx.catalogue;
        catalogue
            .edition(code)
            .ok_or_else(|| ScenarioError::EditionNotFound {
                edition: code.to_string(),
            })
    }

    fn resolve<K: ScenarioKey>(
        &self,
        scenario: &K,
    ) -> Result<(&'c EditionData, &'c ScenarioDefinition), ScenarioError> {
        let edition = self.edition(scenario.edition())?;
        let definition = edition
            .scenarios
            .iter()
            .find(|definition| definition.same_scenario(scenario))
            .filter(|definition| self.enabled(&definition.edition))
            .ok_or_else(|| ScenarioError::ScenarioNotFound {
                index: scenario.index().to_string(),
                edition: scenario.edition().to_string(),
                group: scenario.group().map(str::to_string),
            })?;
        Ok((edition, definition))
    }
}
