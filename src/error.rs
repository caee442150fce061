use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvolutionError>;

/// Errors raised by the GA and by agent pool commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("population accessed before init_population()")]
    PopulationNotInitialized,

    #[error("parent selection requires evaluate_population() first")]
    NotEvaluated,

    #[error("expected {expected} genomes, got {actual}")]
    PopulationSizeMismatch { expected: usize, actual: usize },

    #[error("slot {slot} out of range for {len} agents")]
    SlotOutOfRange { slot: usize, len: usize },

    #[error("trait `{name}` = {value} outside [{min}, {max}]")]
    TraitOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
