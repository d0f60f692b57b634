//! Storage layer using Turso (libSQL)

mod turso;

pub use turso::TursoDb;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    config::StorageConfig,
    pet::{ActionLogEntry, Couple, Pet, StatUpdate},
};

/// High-level storage wrapper that the daemon uses.
#[derive(Clone)]
pub struct Storage {
    db: TursoDb,
}

impl Storage {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let token = std::env::var(&config.auth_token_env).ok();
        let db = TursoDb::connect(&config.url, token.as_deref()).await?;
        db.initialize_schema().await?;
        Ok(Self { db })
    }

    /// Throwaway database, used by tests and local experiments.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&StorageConfig::in_memory()).await
    }

    pub async fn create_couple(
        &self,
        user1_id: i64,
        user2_id: i64,
        user1_name: &str,
        user2_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Couple> {
        self.db
            .upsert_couple(user1_id, user2_id, user1_name, user2_name, now)
            .await
    }

    pub async fn get_couple(&self, couple_id: i64) -> Result<Option<Couple>> {
        self.db.get_couple(couple_id).await
    }

    pub async fn find_couple(&self, user_a: i64, user_b: i64) -> Result<Option<Couple>> {
        self.db.find_couple(user_a, user_b).await
    }

    pub async fn find_user_couple(&self, user_id: i64) -> Result<Option<Couple>> {
        self.db.find_user_couple(user_id).await
    }

    pub async fn update_couple_names(
        &self,
        couple_id: i64,
        user1_name: &str,
        user2_name: &str,
    ) -> Result<bool> {
        self.db
            .update_couple_names(couple_id, user1_name, user2_name)
            .await
    }

    pub async fn create_pet(
        &self,
        couple_id: i64,
        name: &str,
        species: &str,
        now: DateTime<Utc>,
    ) -> Result<Pet> {
        self.db.insert_pet(couple_id, name, species, now).await
    }

    pub async fn get_pet(&self, couple_id: i64) -> Result<Option<Pet>> {
        self.db.get_pet(couple_id).await
    }

    pub async fn update_pet_stats(
        &self,
        pet_id: i64,
        update: &StatUpdate,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.db.update_pet_stats(pet_id, update, at).await
    }

    pub async fn log_action(
        &self,
        pet_id: i64,
        user_id: i64,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.db.log_action(pet_id, user_id, action, at).await
    }

    pub async fn apply_action(
        &self,
        pet: &Pet,
        user_id: i64,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.db
            .apply_action(pet.id, &pet.stats(), user_id, action, at)
            .await
    }

    pub async fn recent_actions(&self, pet_id: i64, limit: usize) -> Result<Vec<ActionLogEntry>> {
        self.db.recent_actions(pet_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn couple_is_found_in_either_order() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage
            .create_couple(11, 22, "Ann", "Ben", t0())
            .await
            .unwrap();

        let forward = storage.find_couple(11, 22).await.unwrap().unwrap();
        let reverse = storage.find_couple(22, 11).await.unwrap().unwrap();
        assert_eq!(forward, couple);
        assert_eq!(reverse, couple);
        assert_eq!(storage.find_user_couple(22).await.unwrap(), Some(couple.clone()));
        assert_eq!(storage.find_user_couple(33).await.unwrap(), None);
        assert_eq!(storage.get_couple(couple.id).await.unwrap(), Some(couple));
    }

    #[tokio::test]
    async fn re_registering_a_pair_keeps_its_id() {
        let storage = Storage::in_memory().await.unwrap();
        let first = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let again = storage
            .create_couple(2, 1, "Bee", "Ay", t0() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(again.id, first.id);
        assert_eq!(again.user1_id, 1);
        assert_eq!(again.user1_name, "Ay");
        assert_eq!(again.user2_name, "Bee");
        assert_eq!(again.created_at, first.created_at);
    }

    #[tokio::test]
    async fn couple_names_can_be_renamed() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        assert!(storage.update_couple_names(couple.id, "Anna", "Bob").await.unwrap());
        assert!(!storage.update_couple_names(999, "X", "Y").await.unwrap());

        let stored = storage.get_couple(couple.id).await.unwrap().unwrap();
        assert_eq!((stored.user1_name.as_str(), stored.user2_name.as_str()), ("Anna", "Bob"));
    }

    #[tokio::test]
    async fn rename_then_re_register_updates_the_same_row() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        assert!(storage.update_couple_names(couple.id, "Anna", "Bob").await.unwrap());

        let again = storage.create_couple(2, 1, "Bobby", "Annie", t0()).await.unwrap();
        assert_eq!(again.id, couple.id);

        let stored = storage.get_couple(couple.id).await.unwrap().unwrap();
        assert_eq!((stored.user1_name.as_str(), stored.user2_name.as_str()), ("Annie", "Bobby"));
        assert_eq!(stored, again);
    }

    #[tokio::test]
    async fn new_pet_round_trips() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let pet = storage.create_pet(couple.id, "Pip", "cat", t0()).await.unwrap();

        let loaded = storage.get_pet(couple.id).await.unwrap().unwrap();
        assert_eq!(loaded, pet);
        assert_eq!((loaded.hunger, loaded.level, loaded.experience), (100, 1, 0));
        assert!(storage.get_pet(couple.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_pet_for_a_couple_is_rejected() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        storage.create_pet(couple.id, "Pip", "cat", t0()).await.unwrap();
        assert!(storage.create_pet(couple.id, "Rex", "dog", t0()).await.is_err());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let pet = storage.create_pet(couple.id, "Pip", "dog", t0()).await.unwrap();
        let later = t0() + Duration::hours(2);

        let update = StatUpdate {
            hunger: Some(42),
            experience: Some(17),
            ..StatUpdate::default()
        };
        assert!(storage.update_pet_stats(pet.id, &update, later).await.unwrap());

        let loaded = storage.get_pet(couple.id).await.unwrap().unwrap();
        assert_eq!(loaded.hunger, 42);
        assert_eq!(loaded.happiness, 100);
        assert_eq!(loaded.energy, 100);
        assert_eq!(loaded.level, 1);
        assert_eq!(loaded.experience, 17);
        assert_eq!(loaded.last_updated, later);
        assert_eq!(loaded.created_at, t0());
    }

    #[tokio::test]
    async fn stats_are_clamped_on_write() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let pet = storage.create_pet(couple.id, "Pip", "dog", t0()).await.unwrap();

        let update = StatUpdate {
            energy: Some(250),
            ..StatUpdate::default()
        };
        storage.update_pet_stats(pet.id, &update, t0()).await.unwrap();
        let loaded = storage.get_pet(couple.id).await.unwrap().unwrap();
        assert_eq!(loaded.energy, 100);
    }

    #[tokio::test]
    async fn empty_update_does_not_touch_the_clock() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let pet = storage.create_pet(couple.id, "Pip", "dog", t0()).await.unwrap();

        let written = storage
            .update_pet_stats(pet.id, &StatUpdate::default(), t0() + Duration::hours(1))
            .await
            .unwrap();
        assert!(!written);
        let loaded = storage.get_pet(couple.id).await.unwrap().unwrap();
        assert_eq!(loaded.last_updated, t0());
    }

    #[tokio::test]
    async fn actions_are_logged_newest_first() {
        let storage = Storage::in_memory().await.unwrap();
        let couple = storage.create_couple(1, 2, "A", "B", t0()).await.unwrap();
        let mut pet = storage.create_pet(couple.id, "Pip", "cat", t0()).await.unwrap();

        storage
            .log_action(pet.id, 1, "feed", t0() + Duration::minutes(1))
            .await
            .unwrap();
        pet.happiness = 80;
        storage
            .apply_action(&pet, 2, "play", t0() + Duration::minutes(2))
            .await
            .unwrap();

        let log = storage.recent_actions(pet.id, 10).await.unwrap();
        let actions: Vec<_> = log.iter().map(|e| (e.user_id, e.action.as_str())).collect();
        assert_eq!(actions, vec![(2, "play"), (1, "feed")]);
        assert_eq!(storage.recent_actions(pet.id, 1).await.unwrap().len(), 1);

        let loaded = storage.get_pet(couple.id).await.unwrap().unwrap();
        assert_eq!(loaded.happiness, 80);
        assert_eq!(loaded.last_updated, t0() + Duration::minutes(2));
    }

    #[tokio::test]
    async fn applying_to_a_missing_pet_logs_nothing() {
        let storage = Storage::in_memory().await.unwrap();
        let ghost = Pet::newborn(404, 1, "Ghost", "cat", t0());
        assert!(storage.apply_action(&ghost, 1, "feed", t0()).await.is_err());
        assert!(storage.recent_actions(404, 10).await.unwrap().is_empty());
    }
}
