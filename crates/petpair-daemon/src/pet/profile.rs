use serde::{Deserialize, Serialize};

/// Per-hour decay rates for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub emoji: String,
    pub hunger_rate: f64,
    pub happiness_rate: f64,
    pub energy_rate: f64,
}

impl SpeciesProfile {
    pub fn new(
        display_name: impl Into<String>,
        emoji: impl Into<String>,
        hunger_rate: f64,
        happiness_rate: f64,
        energy_rate: f64,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            emoji: emoji.into(),
            hunger_rate,
            happiness_rate,
            energy_rate,
        }
    }
}

/// Additive change to the three vitals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    #[serde(default)]
    pub hunger: i32,
    #[serde(default)]
    pub happiness: i32,
    #[serde(default)]
    pub energy: i32,
}

impl StatDeltas {
    pub const fn new(hunger: i32, happiness: i32, energy: i32) -> Self {
        Self {
            hunger,
            happiness,
            energy,
        }
    }
}

/// What an action does to a pet and when it makes sense to perform it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionProfile {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(flatten)]
    pub deltas: StatDeltas,
    /// Base experience reward, before the happiness bonus.
    pub experience: u32,
    /// Lowest energy at which the action is eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_energy: Option<u8>,
    /// Highest energy at which the action is eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy: Option<u8>,
}

impl ActionProfile {
    pub fn new(
        display_name: impl Into<String>,
        emoji: impl Into<String>,
        deltas: StatDeltas,
        experience: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            emoji: emoji.into(),
            deltas,
            experience,
            min_energy: None,
            max_energy: None,
        }
    }

    pub fn with_min_energy(mut self, min: u8) -> Self {
        self.min_energy = Some(min);
        self
    }

    pub fn with_max_energy(mut self, max: u8) -> Self {
        self.max_energy = Some(max);
        self
    }

    pub fn allows_energy(&self, energy: u8) -> bool {
        self.min_energy.is_none_or(|min| energy >= min)
            && self.max_energy.is_none_or(|max| energy <= max)
    }
}
