//! Applies a scenario's (or section's) static data to the live game:
//! monsters, room reveals, solo lock-out, objectives and the loot deck.

use tracing::{debug, error, warn};

use crate::StandeeDice;
use crate::error::ScenarioError;
use crate::game::{Game, MonsterGroup};
use crate::model::{EditionData, MonsterType, RoomDefinition, ScenarioDefinition};
use crate::scenario::ScenarioContext;

/// Upper bound on copies of one objective placed by a single setup.
pub const MAX_OBJECTIVE_COPIES: i64 = 50;

pub fn apply_scenario_data(
    ctx: &ScenarioContext<'_>,
    dice: &mut StandeeDice,
    game: &mut Game,
    edition: &EditionData,
    definition: &ScenarioDefinition,
) {
    let settings = ctx.settings;
    if settings.disable_standees || !settings.scenario_rooms || definition.rooms.is_empty() {
        for name in &definition.monsters {
            ctx.monsters
                .add_monster_by_name(game, name, definition.is_ally(name), edition);
        }
    } else {
        for room in definition.rooms.iter().filter(|room| room.initial) {
            open_door(ctx, dice, game, room, edition, definition);
        }
    }

    if let Some(solo) = definition.solo.as_deref() {
        enforce_solo(ctx, game, solo, definition);
    }

    for objective in &definition.objectives {
        let count = ctx
            .values
            .evaluate(game, &objective.count)
            .unwrap_or_else(|err| {
                warn!(objective = %objective.name, %err, "cannot resolve objective count");
                1
            });
        let count = if count > MAX_OBJECTIVE_COPIES {
            warn!(
                objective = %objective.name,
                count,
                "objective count capped at {}",
                MAX_OBJECTIVE_COPIES
            );
            MAX_OBJECTIVE_COPIES
        } else {
            count
        };
        if count > 1 {
            for n in 1..=count {
                let display_name = format!("{} {}", objective.name, n);
                ctx.characters
                    .add_objective(game, objective, Some(display_name));
            }
        } else {
            ctx.characters.add_objective(game, objective, None);
        }
    }

    if let Some(config) = &definition.loot_deck_config {
        ctx.loot.apply(&mut game.loot_deck, config);
    }
}

/// Reveal a room: record it on the active scenario and place its standees.
pub fn open_door(
    ctx: &ScenarioContext<'_>,
    dice: &mut StandeeDice,
    game: &mut Game,
    room: &RoomDefinition,
    edition: &EditionData,
    definition: &ScenarioDefinition,
) {
    if let Some(scenario) = game.scenario.as_mut() {
        scenario.revealed_rooms.push(room.room_number);
    }
    debug!(room = room.room_number, scenario = %definition.index, "opening door");

    for placement in &room.monsters {
        let Some(mut kind) = placement.resolve_type(game.present_character_count()) else {
            continue;
        };
        let is_ally = definition.is_ally(&placement.name);
        let Some(pos) = ctx
            .monsters
            .add_monster_by_name(game, &placement.name, is_ally, edition)
        else {
            continue;
        };
        if !ctx.settings.automatic_standees {
            continue;
        }
        let Some(group) = game.monsters.get_mut(pos) else {
            continue;
        };
        if ctx.monsters.entity_count(group) >= group.count as usize {
            continue;
        }
        let Some(number) = next_standee_number(group, ctx.settings.random_standees, dice) else {
            warn!(monster = %group.name, "no unused standee number left");
            continue;
        };
        if group.boss {
            kind = MonsterType::Boss;
        }
        ctx.monsters.add_entity(group, number, kind);
    }
}

/// Sequential numbers count down from -1 so they never clash with numbers
/// typed in by hand; random numbers are drawn from `1..=count` until unused.
fn next_standee_number(group: &MonsterGroup, random: bool, dice: &mut StandeeDice) -> Option<i32> {
    if !random {
        return Some(-(group.entities.len() as i32 + 1));
    }
    let capacity = group.count;
    if (1..=capacity).all(|n| group.has_number(n as i32)) {
        return None;
    }
    loop {
        let number = dice.roll(capacity) as i32;
        if !group.has_number(number) {
            return Some(number);
        }
    }
}

fn enforce_solo(ctx: &ScenarioContext<'_>, game: &mut Game, solo: &str, definition: &ScenarioDefinition) {
    let is_solo = |name: &str, edition: &str| name == solo && edition == definition.edition;

    for character in &mut game.characters {
        if !is_solo(&character.name, &character.edition) {
            character.absent = true;
        }
    }

    if game
        .characters
        .iter()
        .any(|character| is_solo(&character.name, &character.edition))
    {
        return;
    }

    match ctx.catalogue.find_character(solo, &definition.edition) {
        Some(data) => ctx.characters.add_character(game, data, 1),
        None => {
            let err = ScenarioError::CharacterNotFound {
                name: solo.to_string(),
                edition: definition.edition.clone(),
            };
            error!(scenario = %definition.name, %err, "cannot add solo character");
        }
    }
}
