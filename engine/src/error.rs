use thiserror::Error;

/// Lookup failures raised while selecting or setting up scenario content.
///
/// These never leave the game half-configured: the operation that hits one
/// stops before touching game state (or skips only the step that failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("could not find edition data for '{edition}'")]
    EditionNotFound { edition: String },
    #[error("could not find scenario data for {edition} #{index} (group {group:?})")]
    ScenarioNotFound {
        index: String,
        edition: String,
        group: Option<String>,
    },
    #[error("could not find section data for {edition} #{index} (group {group:?})")]
    SectionNotFound {
        index: String,
        edition: String,
        group: Option<String>,
    },
    #[error("solo scenario character not found: '{name}' ({edition})")]
    CharacterNotFound { name: String, edition: String },
    #[error("room {room} is not part of any active scenario or section")]
    RoomNotFound { room: u32 },
}

/// Errors from lexing, parsing or evaluating a rule/value expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: usize },
    #[error("unknown identifier '{name}' at {position}")]
    UnknownIdentifier { name: String, position: usize },
    #[error("unexpected {found} at {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        position: usize,
    },
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("variable '{symbol}' has no value here")]
    Unbound { symbol: char },
    #[error("expression did not produce a finite number")]
    NotANumber,
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}
