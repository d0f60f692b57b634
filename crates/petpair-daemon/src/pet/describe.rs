use serde::Serialize;

use super::Pet;

/// Overall mood, from the average of the three vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Content,
    Sad,
    Miserable,
}

impl Mood {
    pub fn of(pet: &Pet) -> Self {
        // compare sums against 3× the band to avoid fractional averages
        let total = u32::from(pet.hunger) + u32::from(pet.happiness) + u32::from(pet.energy);
        match total {
            t if t >= 240 => Mood::Happy,
            t if t >= 180 => Mood::Content,
            t if t >= 120 => Mood::Sad,
            _ => Mood::Miserable,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Content => "😐",
            Mood::Sad => "😔",
            Mood::Miserable => "😢",
        }
    }
}

/// Human-readable condition, e.g. "hungry, very happy".
pub fn describe(pet: &Pet) -> String {
    let mut notes = Vec::new();

    match pet.hunger {
        0..=20 => notes.push("very hungry"),
        21..=40 => notes.push("hungry"),
        _ => {}
    }

    match pet.happiness {
        0..=20 => notes.push("very sad"),
        21..=40 => notes.push("sad"),
        80.. => notes.push("very happy"),
        _ => {}
    }

    match pet.energy {
        0..=20 => notes.push("exhausted"),
        21..=40 => notes.push("tired"),
        80.. => notes.push("full of energy"),
        _ => {}
    }

    if notes.is_empty() {
        notes.push("feeling fine");
    }
    notes.join(", ")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn pet(hunger: u8, happiness: u8, energy: u8) -> Pet {
        Pet {
            hunger,
            happiness,
            energy,
            ..Pet::newborn(1, 1, "Pip", "cat", Utc::now())
        }
    }

    #[test]
    fn mood_bands() {
        assert_eq!(Mood::of(&pet(80, 80, 80)), Mood::Happy);
        assert_eq!(Mood::of(&pet(100, 100, 40)), Mood::Happy);
        assert_eq!(Mood::of(&pet(100, 100, 39)), Mood::Content);
        assert_eq!(Mood::of(&pet(79, 80, 80)), Mood::Content);
        assert_eq!(Mood::of(&pet(60, 60, 60)), Mood::Content);
        assert_eq!(Mood::of(&pet(40, 40, 40)), Mood::Sad);
        assert_eq!(Mood::of(&pet(40, 40, 39)), Mood::Miserable);
        assert_eq!(Mood::of(&pet(0, 0, 0)), Mood::Miserable);
    }

    #[test]
    fn all_triggered_descriptors_are_listed() {
        assert_eq!(describe(&pet(10, 30, 90)), "very hungry, sad, full of energy");
        assert_eq!(describe(&pet(40, 80, 20)), "hungry, very happy, exhausted");
        assert_eq!(describe(&pet(100, 10, 35)), "very sad, tired");
    }

    #[test]
    fn fine_when_nothing_triggers() {
        assert_eq!(describe(&pet(60, 60, 60)), "feeling fine");
        // hunger has no "high" descriptor
        assert_eq!(describe(&pet(100, 79, 79)), "feeling fine");
    }
}
