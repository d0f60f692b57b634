use serde::Serialize;

use super::{ActionProfile, Pet, PetRules, RulesError, clamp_stat};

/// Result of resolving one action against a caught-up pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub pet: Pet,
    /// Raw gain, reported even when a level-up reset the pool.
    pub experience_gained: u32,
    pub leveled_up: bool,
}

impl PetRules {
    /// Applies an action's deltas, experience reward and level-up check.
    ///
    /// Eligibility is not consulted here; see [`PetRules::can_perform_action`].
    pub fn resolve(&self, pet: &Pet, action: &str) -> Result<ActionOutcome, RulesError> {
        let profile = self.action(action)?;
        let experience_gained = self.experience_gain(profile, pet.happiness);

        let mut next = Pet {
            hunger: apply_delta(pet.hunger, profile.deltas.hunger),
            happiness: apply_delta(pet.happiness, profile.deltas.happiness),
            energy: apply_delta(pet.energy, profile.deltas.energy),
            ..pet.clone()
        };

        // Surplus above the threshold is not carried into the next level.
        let experience = pet.experience.saturating_add(experience_gained);
        if experience >= pet.level.saturating_mul(self.level_threshold) {
            next.level = pet.level.saturating_add(1);
            next.experience = 0;
        } else {
            next.experience = experience;
        }

        Ok(ActionOutcome {
            leveled_up: next.level > pet.level,
            pet: next,
            experience_gained,
        })
    }

    /// Whether the pet is in a state where the action makes sense.
    pub fn can_perform_action(&self, pet: &Pet, action: &str) -> Result<bool, RulesError> {
        Ok(self.action(action)?.allows_energy(pet.energy))
    }

    /// Base reward plus one point per `happiness_bonus_step` of happiness
    /// before the action.
    pub fn experience_gain(&self, profile: &ActionProfile, happiness: u8) -> u32 {
        profile.experience + u32::from(happiness / self.happiness_bonus_step)
    }
}

fn apply_delta(current: u8, delta: i32) -> u8 {
    clamp_stat(i64::from(current) + i64::from(delta))
}
