//! Pet model and the pure rules that move it through time and actions.

mod action;
mod decay;
mod describe;
mod error;
mod model;
mod profile;

use std::collections::BTreeMap;

use rand::{Rng, seq::IteratorRandom, seq::SliceRandom};

pub use action::ActionOutcome;
pub use describe::{Mood, describe};
pub use error::RulesError;
pub use model::{
    ActionLogEntry, Couple, MAX_STAT, MIN_STAT, Pet, StatUpdate, clamp_stat,
};
pub use profile::{ActionProfile, SpeciesProfile, StatDeltas};

use crate::config::RulesConfig;

/// Immutable game balance shared by every request.
#[derive(Debug, Clone)]
pub struct PetRules {
    species: BTreeMap<String, SpeciesProfile>,
    actions: BTreeMap<String, ActionProfile>,
    names: Vec<String>,
    decay_debounce_hours: f64,
    level_threshold: u32,
    happiness_bonus_step: u8,
    enforce_eligibility: bool,
}

impl PetRules {
    /// Builds the rules after validating `config`.
    pub fn from_config(config: &RulesConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &RulesConfig) -> Self {
        Self {
            species: config.species.clone(),
            actions: config.actions.clone(),
            names: config.names.clone(),
            decay_debounce_hours: config.decay_debounce_hours,
            level_threshold: config.level_threshold,
            happiness_bonus_step: config.happiness_bonus_step,
            enforce_eligibility: config.enforce_eligibility,
        }
    }

    pub fn species(&self, tag: &str) -> Result<&SpeciesProfile, RulesError> {
        self.species
            .get(tag)
            .ok_or_else(|| RulesError::UnknownSpecies(tag.to_string()))
    }

    pub fn action(&self, tag: &str) -> Result<&ActionProfile, RulesError> {
        self.actions
            .get(tag)
            .ok_or_else(|| RulesError::UnknownAction(tag.to_string()))
    }

    pub fn species_catalog(&self) -> &BTreeMap<String, SpeciesProfile> {
        &self.species
    }

    pub fn action_catalog(&self) -> &BTreeMap<String, ActionProfile> {
        &self.actions
    }

    /// Whether the request layer should refuse ineligible actions.
    pub fn enforce_eligibility(&self) -> bool {
        self.enforce_eligibility
    }

    pub fn random_species<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, RulesError> {
        self.species
            .keys()
            .choose(rng)
            .map(String::as_str)
            .ok_or(RulesError::EmptyCatalog("species"))
    }

    pub fn random_name<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, RulesError> {
        self.names
            .choose(rng)
            .map(String::as_str)
            .ok_or(RulesError::EmptyCatalog("pet names"))
    }

    /// Species emoji followed by the mood emoji, e.g. "🐱😊".
    pub fn status_badge(&self, pet: &Pet) -> Result<String, RulesError> {
        let species = self.species(&pet.species)?;
        Ok(format!("{}{}", species.emoji, Mood::of(pet).emoji()))
    }
}

impl Default for PetRules {
    fn default() -> Self {
        Self::build(&RulesConfig::default())
    }
}
