use chrono::{DateTime, Utc};

use super::{Pet, PetRules, RulesError};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

impl PetRules {
    /// Catches a pet's vitals up to `now`.
    ///
    /// Intervals shorter than the debounce window (6 minutes by default)
    /// leave the snapshot untouched, including its `last_updated`. Otherwise
    /// each vital loses `floor(hours × rate)` points, floored at zero, and
    /// `last_updated` moves to `now`.
    pub fn advance(&self, pet: &Pet, now: DateTime<Utc>) -> Result<Pet, RulesError> {
        let hours = hours_between(pet.last_updated, now);
        if hours < self.decay_debounce_hours {
            return Ok(pet.clone());
        }

        let species = self.species(&pet.species)?;
        Ok(Pet {
            hunger: decay_stat(pet.hunger, hours, species.hunger_rate),
            happiness: decay_stat(pet.happiness, hours, species.happiness_rate),
            energy: decay_stat(pet.energy, hours, species.energy_rate),
            last_updated: now,
            ..pet.clone()
        })
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Fractional loss below one point is dropped.
fn decay_stat(current: u8, hours: f64, rate_per_hour: f64) -> u8 {
    let loss = (hours * rate_per_hour).floor();
    let remaining = f64::from(current) - loss;
    if remaining <= 0.0 { 0 } else { remaining as u8 }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::config::RulesConfig;
    use crate::pet::SpeciesProfile;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn rules_with(rate: f64) -> PetRules {
        let mut config = RulesConfig::default();
        config.species.insert(
            "test".into(),
            SpeciesProfile::new("Test", "🧪", rate, rate, rate),
        );
        PetRules::from_config(&config).unwrap()
    }

    fn pet(species: &str, stats: (u8, u8, u8)) -> Pet {
        Pet {
            hunger: stats.0,
            happiness: stats.1,
            energy: stats.2,
            ..Pet::newborn(1, 1, "Pip", species, epoch())
        }
    }

    #[test]
    fn short_interval_is_a_no_op() {
        let rules = rules_with(50.0);
        let before = pet("test", (50, 50, 50));
        let after = rules
            .advance(&before, epoch() + Duration::minutes(5) + Duration::seconds(59))
            .unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn clock_skew_is_a_no_op() {
        let rules = rules_with(2.0);
        let before = pet("test", (50, 50, 50));
        let after = rules.advance(&before, epoch() - Duration::hours(3)).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn two_hours_at_two_per_hour_costs_four() {
        let rules = rules_with(2.0);
        let now = epoch() + Duration::hours(2);
        let after = rules.advance(&pet("test", (50, 3, 4)), now).unwrap();
        assert_eq!(after.hunger, 46);
        assert_eq!(after.happiness, 0);
        assert_eq!(after.energy, 0);
        assert_eq!(after.last_updated, now);
    }

    #[test]
    fn cat_loses_hunger_over_three_hours() {
        let rules = PetRules::default();
        let after = rules
            .advance(&pet("cat", (50, 50, 50)), epoch() + Duration::hours(3))
            .unwrap();
        // cat: hunger 2.0/h, happiness 1.5/h, energy 1.8/h
        assert_eq!(after.hunger, 44);
        assert_eq!(after.happiness, 46);
        assert_eq!(after.energy, 45);
    }

    #[test]
    fn fractional_decay_is_truncated() {
        let rules = PetRules::default();
        // 0.5h × 1.5/h = 0.75 → nothing lost for happiness; 0.5 × 2.0 = 1 for hunger
        let after = rules
            .advance(&pet("cat", (80, 80, 80)), epoch() + Duration::minutes(30))
            .unwrap();
        assert_eq!(after.hunger, 79);
        assert_eq!(after.happiness, 80);
        assert_eq!(after.energy, 80);
    }

    #[test]
    fn decaying_twice_at_the_same_instant_is_idempotent() {
        let rules = PetRules::default();
        let now = epoch() + Duration::hours(5);
        let once = rules.advance(&pet("dog", (90, 90, 90)), now).unwrap();
        let twice = rules.advance(&once, now).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn long_absence_bottoms_out_at_zero() {
        let rules = PetRules::default();
        let after = rules
            .advance(&pet("rabbit", (100, 100, 100)), epoch() + Duration::days(30))
            .unwrap();
        assert_eq!((after.hunger, after.happiness, after.energy), (0, 0, 0));
        assert_eq!(after.level, 1);
    }

    #[test]
    fn unknown_species_is_reported_once_decay_is_due() {
        let rules = PetRules::default();
        let stray = pet("dragon", (50, 50, 50));
        assert_eq!(
            rules.advance(&stray, epoch() + Duration::minutes(1)),
            Ok(stray.clone())
        );
        assert_eq!(
            rules.advance(&stray, epoch() + Duration::hours(1)),
            Err(RulesError::UnknownSpecies("dragon".into()))
        );
    }
}
