//! Request-level pet operations on top of storage and the pure rules.

mod error;
mod locks;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

pub use error::{Result, ServiceError};
pub use locks::PetLocks;

use crate::{
    pet::{ActionLogEntry, Couple, Mood, Pet, PetRules, StatUpdate, describe},
    storage::Storage,
};

const MAX_PET_NAME_CHARS: usize = 32;
const DEFAULT_USER1_NAME: &str = "User 1";
const DEFAULT_USER2_NAME: &str = "User 2";

/// Pet as shown to players: caught-up stats plus presentation helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetStatus {
    #[serde(flatten)]
    pub pet: Pet,
    pub mood: Mood,
    pub badge: String,
    pub description: String,
}

/// Result of an action, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: String,
    pub pet: Pet,
    pub experience_gain: u32,
    pub level_up: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewCouple {
    pub user1_id: i64,
    pub user2_id: i64,
    pub user1_name: Option<String>,
    pub user2_name: Option<String>,
}

#[derive(Clone)]
pub struct PetService {
    storage: Storage,
    rules: Arc<PetRules>,
    locks: PetLocks,
}

impl PetService {
    pub fn new(storage: Storage, rules: PetRules) -> Self {
        Self {
            storage,
            rules: Arc::new(rules),
            locks: PetLocks::default(),
        }
    }

    pub fn rules(&self) -> &PetRules {
        &self.rules
    }

    pub async fn user_couple(&self, user_id: i64) -> Result<Option<Couple>> {
        require_user_id(user_id, "user_id")?;
        Ok(self.storage.find_user_couple(user_id).await?)
    }

    pub async fn couple(&self, couple_id: i64) -> Result<Couple> {
        self.storage
            .get_couple(couple_id)
            .await?
            .ok_or(ServiceError::CoupleNotFound(couple_id))
    }

    pub async fn create_couple(&self, request: NewCouple, now: DateTime<Utc>) -> Result<Couple> {
        require_user_id(request.user1_id, "user1_id")?;
        require_user_id(request.user2_id, "user2_id")?;
        if request.user1_id == request.user2_id {
            return Err(ServiceError::InvalidRequest(
                "a couple needs two different users".into(),
            ));
        }

        let user1_name = display_name(request.user1_name, DEFAULT_USER1_NAME);
        let user2_name = display_name(request.user2_name, DEFAULT_USER2_NAME);
        let couple = self
            .storage
            .create_couple(
                request.user1_id,
                request.user2_id,
                &user1_name,
                &user2_name,
                now,
            )
            .await?;

        info!(
            couple_id = couple.id,
            user1 = couple.user1_id,
            user2 = couple.user2_id,
            "Couple registered"
        );
        Ok(couple)
    }

    /// Adopts the couple's pet. Species and name are drawn at random when
    /// not given.
    pub async fn create_pet(
        &self,
        couple_id: i64,
        species: Option<String>,
        name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Pet> {
        let _guard = self.locks.acquire(couple_id).await;

        self.couple(couple_id).await?;
        if self.storage.get_pet(couple_id).await?.is_some() {
            return Err(ServiceError::PetAlreadyExists(couple_id));
        }

        let (species, name) = self.pick_identity(species, name)?;
        let pet = self
            .storage
            .create_pet(couple_id, &name, &species, now)
            .await?;

        info!(couple_id, pet_id = pet.id, species = %pet.species, name = %pet.name, "Pet adopted");
        Ok(pet)
    }

    /// Current status, with decay applied and persisted.
    pub async fn pet_status(&self, couple_id: i64, now: DateTime<Utc>) -> Result<PetStatus> {
        let _guard = self.locks.acquire(couple_id).await;
        let pet = self.catch_up(couple_id, now).await?;
        self.status_of(pet)
    }

    pub async fn can_perform_action(
        &self,
        couple_id: i64,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.rules.action(action)?;
        let _guard = self.locks.acquire(couple_id).await;
        let pet = self.catch_up(couple_id, now).await?;
        Ok(self.rules.can_perform_action(&pet, action)?)
    }

    pub async fn perform_action(
        &self,
        couple_id: i64,
        user_id: i64,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<ActionReport> {
        require_user_id(user_id, "user_id")?;
        let _guard = self.locks.acquire(couple_id).await;

        let pet = self.load(couple_id).await?;
        let pet = self.rules.advance(&pet, now)?;

        if self.rules.enforce_eligibility() && !self.rules.can_perform_action(&pet, action)? {
            return Err(ServiceError::ActionNotAllowed {
                pet: pet.name.clone(),
                action: action.to_string(),
                energy: pet.energy,
            });
        }

        let outcome = self.rules.resolve(&pet, action)?;
        self.storage
            .apply_action(&outcome.pet, user_id, action, now)
            .await?;

        info!(
            couple_id,
            user_id,
            action,
            experience_gain = outcome.experience_gained,
            level = outcome.pet.level,
            "Action performed"
        );
        if outcome.leveled_up {
            info!(couple_id, level = outcome.pet.level, "{} leveled up", outcome.pet.name);
        }

        Ok(ActionReport {
            action: action.to_string(),
            pet: Pet {
                last_updated: now,
                ..outcome.pet
            },
            experience_gain: outcome.experience_gained,
            level_up: outcome.leveled_up,
        })
    }

    pub async fn recent_actions(&self, couple_id: i64, limit: usize) -> Result<Vec<ActionLogEntry>> {
        let pet = self.load(couple_id).await?;
        Ok(self.storage.recent_actions(pet.id, limit).await?)
    }

    fn status_of(&self, pet: Pet) -> Result<PetStatus> {
        Ok(PetStatus {
            mood: Mood::of(&pet),
            badge: self.rules.status_badge(&pet)?,
            description: describe(&pet),
            pet,
        })
    }

    async fn load(&self, couple_id: i64) -> Result<Pet> {
        self.storage
            .get_pet(couple_id)
            .await?
            .ok_or(ServiceError::PetNotFound(couple_id))
    }

    /// Loads the pet and persists any decay that is due. Callers hold the
    /// couple's lock.
    async fn catch_up(&self, couple_id: i64, now: DateTime<Utc>) -> Result<Pet> {
        let pet = self.load(couple_id).await?;
        let advanced = self.rules.advance(&pet, now)?;
        if advanced != pet {
            self.storage
                .update_pet_stats(advanced.id, &StatUpdate::vitals(&advanced), now)
                .await?;
            debug!(
                couple_id,
                hunger = advanced.hunger,
                happiness = advanced.happiness,
                energy = advanced.energy,
                "Decay applied"
            );
        }
        Ok(advanced)
    }

    fn pick_identity(
        &self,
        species: Option<String>,
        name: Option<String>,
    ) -> Result<(String, String)> {
        let mut rng = rand::thread_rng();

        let species = match species.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(tag) => {
                self.rules
                    .species(&tag)
                    .map_err(|_| ServiceError::UnknownSpecies(tag.clone()))?;
                tag
            }
            None => self.rules.random_species(&mut rng)?.to_string(),
        };

        let name = match name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            Some(name) if name.chars().count() > MAX_PET_NAME_CHARS => {
                return Err(ServiceError::InvalidRequest(format!(
                    "pet name must be at most {MAX_PET_NAME_CHARS} characters"
                )));
            }
            Some(name) => name,
            None => self.rules.random_name(&mut rng)?.to_string(),
        };

        Ok((species, name))
    }
}

fn require_user_id(id: i64, field: &str) -> Result<()> {
    if id <= 0 {
        return Err(ServiceError::InvalidRequest(format!("{field} required")));
    }
    Ok(())
}

fn display_name(name: Option<String>, fallback: &str) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
