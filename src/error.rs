use thiserror::Error;

/// Failures of the unique random sampler. All of them mean the caller asked
/// for a value the range cannot provide, which is a configuration fault.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: u32, max: u32 },

    #[error("bounds must be strictly positive (min {min}, max {max})")]
    NonPositiveBound { min: u32, max: u32 },

    #[error("cannot exclude the only allowed value {value}")]
    SingleValueUsed { value: u32 },

    #[error("no unused value left in [{min}, {max}]")]
    Exhausted { min: u32, max: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("a combination pool needs at least one fact pair")]
    Empty,

    #[error("factor out of range in [{a}, {b}]")]
    FactorOutOfRange { a: u32, b: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the quiz has not been started")]
    NotStarted,

    #[error("no question is waiting for an answer")]
    NoPendingQuestion,

    #[error("the quiz is already finished")]
    Finished,

    #[error("could not build answer proposals: {0}")]
    Sample(#[from] SampleError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player name must not be empty")]
    EmptyName,

    #[error("player \"{0}\" already exists")]
    DuplicateName(String),

    #[error("player \"{0}\" not found")]
    UnknownPlayer(String),

    #[error("player \"{name}\" has a high score of {high_score} and cannot be deleted")]
    Protected { name: String, high_score: u32 },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Rejections at the persistence boundary, raised before any record reaches
/// the engine.
#[derive(Debug, Error)]
pub enum PlayerDataError {
    #[error("malformed player data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("a player record has an empty name")]
    EmptyName,

    #[error("player \"{0}\" appears more than once")]
    DuplicateName(String),

    #[error("player \"{0}\" has no combinations")]
    EmptyCombinations(String),

    #[error("player \"{name}\" has a combination with an unsupported factor: [{a}, {b}]")]
    FactorOutOfRange { name: String, a: u32, b: u32 },
}
