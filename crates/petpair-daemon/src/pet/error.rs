use thiserror::Error;

/// Failures of the pure pet rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The pet was stored under a species this deployment does not know.
    #[error("unknown species: {0}")]
    UnknownSpecies(String),

    #[error("no {0} configured")]
    EmptyCatalog(&'static str),
}
