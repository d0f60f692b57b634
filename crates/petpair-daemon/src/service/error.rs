use thiserror::Error;

use crate::pet::RulesError;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Everything a pet request can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("couple {0} not found")]
    CoupleNotFound(i64),

    #[error("no pet found for couple {0}")]
    PetNotFound(i64),

    #[error("couple {0} already has a pet")]
    PetAlreadyExists(i64),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown pet type: {0}")]
    UnknownSpecies(String),

    #[error("{pet} can't {action} right now (energy {energy})")]
    ActionNotAllowed {
        pet: String,
        action: String,
        energy: u8,
    },

    #[error("{0}")]
    InvalidRequest(String),

    /// Stored data does not match the loaded configuration.
    #[error("configuration integrity fault: {0}")]
    ConfigIntegrity(RulesError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    /// Faults of the deployment rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::ConfigIntegrity(_) | Self::Storage(_))
    }
}

impl From<RulesError> for ServiceError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::UnknownAction(action) => Self::UnknownAction(action),
            other => Self::ConfigIntegrity(other),
        }
    }
}
