use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_STAT: u8 = 0;
pub const MAX_STAT: u8 = 100;

/// Brings any intermediate stat value back into `0..=100`.
pub fn clamp_stat(value: i64) -> u8 {
    value.clamp(i64::from(MIN_STAT), i64::from(MAX_STAT)) as u8
}

/// The shared pet of one couple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub couple_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub species: String,
    pub hunger: u8,
    pub happiness: u8,
    pub energy: u8,
    pub level: u32,
    pub experience: u32,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Pet {
    /// A freshly adopted pet: full stats, level 1, no experience.
    pub fn newborn(
        id: i64,
        couple_id: i64,
        name: impl Into<String>,
        species: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            couple_id,
            name: name.into(),
            species: species.into(),
            hunger: MAX_STAT,
            happiness: MAX_STAT,
            energy: MAX_STAT,
            level: 1,
            experience: 0,
            last_updated: now,
            created_at: now,
        }
    }

    pub fn stats(&self) -> StatUpdate {
        StatUpdate {
            hunger: Some(self.hunger),
            happiness: Some(self.happiness),
            energy: Some(self.energy),
            level: Some(self.level),
            experience: Some(self.experience),
        }
    }
}

/// Partial stat write. `None` fields are left untouched by storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatUpdate {
    pub hunger: Option<u8>,
    pub happiness: Option<u8>,
    pub energy: Option<u8>,
    pub level: Option<u32>,
    pub experience: Option<u32>,
}

impl StatUpdate {
    /// Only the three decaying stats; level and experience stay as stored.
    pub fn vitals(pet: &Pet) -> Self {
        Self {
            hunger: Some(pet.hunger),
            happiness: Some(pet.happiness),
            energy: Some(pet.energy),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Two users sharing one pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub user1_name: String,
    pub user2_name: String,
    pub created_at: DateTime<Utc>,
}

/// Audit record of one action performed on a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: i64,
    pub pet_id: i64,
    pub user_id: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_stat_stays_in_range() {
        for stat in [0i64, 1, 50, 99, 100] {
            for delta in [-1000i64, -101, -40, -1, 0, 1, 30, 101, 1000] {
                let clamped = clamp_stat(stat + delta);
                assert!(clamped <= MAX_STAT, "{stat}+{delta} -> {clamped}");
            }
        }
        assert_eq!(clamp_stat(-5), 0);
        assert_eq!(clamp_stat(130), 100);
        assert_eq!(clamp_stat(42), 42);
    }

    #[test]
    fn newborn_starts_full() {
        let now = Utc::now();
        let pet = Pet::newborn(1, 7, "Pip", "cat", now);
        assert_eq!((pet.hunger, pet.happiness, pet.energy), (100, 100, 100));
        assert_eq!((pet.level, pet.experience), (1, 0));
        assert_eq!(pet.last_updated, pet.created_at);
    }

    #[test]
    fn species_serializes_as_type() {
        let pet = Pet::newborn(1, 7, "Pip", "dog", Utc::now());
        let value = serde_json::to_value(&pet).unwrap();
        assert_eq!(value["type"], "dog");
        assert!(value.get("species").is_none());
    }
}
