//! Campaign progression: which scenarios a party may currently pick.
//!
//! Unlock, block and requirement edges only ever connect scenarios of the
//! same edition (and, for unlocks and requirements, the same group).

use crate::model::{CampaignProgress, ScenarioDefinition, ScenarioKey};
use crate::ports::EditionRepository;
use crate::settings::Settings;

/// Scenarios offered for `edition` (every enabled scenario when `None`).
///
/// Outside campaign mode, or when no enabled scenario is marked initial, the
/// edition's scenarios are returned unfiltered.
pub fn selectable_scenarios<'c>(
    catalogue: &'c dyn EditionRepository,
    settings: &Settings,
    party: Option<&CampaignProgress>,
    edition: Option<&str>,
) -> Vec<&'c ScenarioDefinition> {
    let pool: Vec<&'c ScenarioDefinition> = catalogue
        .editions()
        .iter()
        .filter(|data| settings.edition_enabled(&data.edition))
        .flat_map(|data| data.scenarios.iter())
        .collect();

    let Some(edition) = edition else {
        return pool;
    };

    let campaign = party
        .filter(|party| party.campaign_mode)
        .filter(|_| pool.iter().any(|scenario| scenario.initial));
    let Some(party) = campaign else {
        return pool
            .into_iter()
            .filter(|scenario| scenario.edition == edition)
            .collect();
    };

    pool.iter()
        .copied()
        .filter(|candidate| candidate.edition == edition && is_selectable(candidate, &pool, party))
        .collect()
}

/// True if any completed scenario of the definition's edition blocks it.
pub fn is_blocked(
    catalogue: &dyn EditionRepository,
    party: Option<&CampaignProgress>,
    definition: &ScenarioDefinition,
) -> bool {
    let (Some(party), Some(edition)) = (party, catalogue.edition(&definition.edition)) else {
        return false;
    };
    party
        .scenarios
        .iter()
        .filter_map(|record| edition.scenarios.iter().find(|s| s.same_scenario(record)))
        .any(|completed| completed.blocks.contains(&definition.index))
}

fn is_selectable(
    candidate: &ScenarioDefinition,
    pool: &[&ScenarioDefinition],
    party: &CampaignProgress,
) -> bool {
    if candidate.initial || party.has_completed(candidate) || party.is_manually_unlocked(candidate) {
        return true;
    }
    unlocked_by_graph(candidate, pool, party) && requirements_met(candidate, party)
}

fn unlocked_by_graph(
    candidate: &ScenarioDefinition,
    pool: &[&ScenarioDefinition],
    party: &CampaignProgress,
) -> bool {
    party
        .scenarios
        .iter()
        .filter_map(|record| pool.iter().find(|s| s.same_scenario(record)))
        .any(|completed| {
            completed.edition == candidate.edition
                && completed.group == candidate.group
                && completed.unlocks.contains(&candidate.index)
        })
}

fn requirements_met(candidate: &ScenarioDefinition, party: &CampaignProgress) -> bool {
    candidate.requires.is_empty()
        || candidate.requires.iter().any(|all_of| {
            all_of.iter().all(|required| {
                party.scenarios.iter().any(|record| {
                    &record.index == required
                        && record.group == candidate.group
                        && record.edition == candidate.edition
                })
            })
        })
}
