use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod catalogue;
pub mod conditions;
pub mod content;
pub mod error;
pub mod game;
pub mod model;
pub mod ports;
pub mod progression;
pub mod rules;
pub mod scenario;
pub mod settings;
pub mod setup;
pub mod standard;

pub use catalogue::Catalogue;
pub use error::{ConditionError, ScenarioError};
pub use game::{Game, GameState, LiveScenario, ScenarioPhase, TriggeredRule};
pub use model::{CampaignProgress, ScenarioDefinition, ScenarioIdentifier, ScenarioKey, ScenarioRecord};
pub use scenario::{ScenarioContext, ScenarioManager};
pub use settings::Settings;
pub use standard::Standard;

/// Source of random standee numbers.
#[derive(Debug, Clone)]
pub struct StandeeDice {
    source: DiceSource,
}

#[derive(Debug, Clone)]
enum DiceSource {
    Seeded(ChaCha8Rng),
    /// Replays fixed rolls in order, wrapping around.
    Scripted { rolls: Vec<u32>, next: usize },
}

impl StandeeDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: DiceSource::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn from_scripted(rolls: Vec<u32>) -> Self {
        Self {
            source: DiceSource::Scripted { rolls, next: 0 },
        }
    }

    /// Uniform roll in `1..=sides`.
    pub fn roll(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.source {
            DiceSource::Seeded(rng) => rng.gen_range(1..=sides),
            DiceSource::Scripted { rolls, next } => {
                let value = match rolls.len() {
                    0 => 1,
                    len => rolls[*next % len],
                };
                *next += 1;
                value.clamp(1, sides)
            }
        }
    }
}
