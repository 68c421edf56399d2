//! Which scenario rules currently fire.

use tracing::warn;

use crate::conditions::Bindings;
use crate::error::ConditionError;
use crate::game::{Game, GameState, TriggeredRule};
use crate::model::{ScenarioDefinition, ScenarioRule};

/// A rule fires when its round condition holds and the game is in the
/// matching phase: `start` rules at round begin (draw), the others when
/// advancing to the next round.
pub fn rule_fires(
    rule: &ScenarioRule,
    state: GameState,
    bindings: &Bindings,
) -> Result<bool, ConditionError> {
    let holds = rule.round.evaluate(bindings)?;
    let in_phase = match state {
        GameState::Next => !rule.start,
        GameState::Draw => rule.start,
    };
    Ok(holds && in_phase)
}

/// Recompute, from scratch, every firing rule of the active scenario and
/// its sections. Rules whose condition cannot be evaluated are skipped.
pub fn triggered_rules(game: &Game) -> Vec<TriggeredRule> {
    let bindings = Bindings::for_rules(game.round, game.present_character_count());
    let mut triggered = Vec::new();

    if let Some(scenario) = &game.scenario {
        collect(&scenario.definition, false, game.state, &bindings, &mut triggered);
    }
    for section in &game.sections {
        collect(&section.definition, true, game.state, &bindings, &mut triggered);
    }

    triggered
}

fn collect(
    definition: &ScenarioDefinition,
    section: bool,
    state: GameState,
    bindings: &Bindings,
    out: &mut Vec<TriggeredRule>,
) {
    for (index, rule) in definition.rules.iter().enumerate() {
        match rule_fires(rule, state, bindings) {
            Ok(true) => out.push(TriggeredRule {
                edition: definition.edition.clone(),
                scenario: definition.index.clone(),
                group: definition.group.clone(),
                index: index + 1,
                section,
            }),
            Ok(false) => {}
            Err(err) => warn!(
                condition = %rule.round,
                index,
                scenario = %definition.index,
                %err,
                "cannot apply scenario rule"
            ),
        }
    }
}
