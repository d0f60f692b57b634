//! Turso (libSQL) database client

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Row, params};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::pet::{ActionLogEntry, Couple, Pet, StatUpdate, clamp_stat};

const PET_COLUMNS: &str = "id, couple_id, name, pet_type, hunger, happiness, energy, level, experience, last_updated, created_at";
const COUPLE_COLUMNS: &str = "id, user1_id, user2_id, user1_name, user2_name, created_at";

const UPDATE_PET_STATS: &str = r#"
    UPDATE pets SET
        hunger = COALESCE(?1, hunger),
        happiness = COALESCE(?2, happiness),
        energy = COALESCE(?3, energy),
        level = COALESCE(?4, level),
        experience = COALESCE(?5, experience),
        last_updated = ?6
    WHERE id = ?7
"#;

const UPDATE_COUPLE_NAMES: &str =
    "UPDATE couples SET user1_name = ?1, user2_name = ?2 WHERE id = ?3";

const INSERT_ACTION: &str = r#"
    INSERT INTO actions (pet_id, user_id, action_type, timestamp)
    VALUES (?1, ?2, ?3, ?4)
"#;

/// Turso database client
#[derive(Clone)]
pub struct TursoDb {
    conn: Arc<Mutex<Connection>>,
}

impl TursoDb {
    /// Connect to a Turso database
    pub async fn connect(url: &str, auth_token: Option<&str>) -> Result<Self> {
        let db = if url.starts_with("libsql://") || url.starts_with("https://") {
            // Remote Turso database
            let token = auth_token
                .map(|s| s.to_string())
                .context("an auth token is required for a remote database")?;

            Builder::new_remote(url.to_string(), token)
                .build()
                .await
                .context("Failed to connect to remote Turso database")?
        } else {
            // Local file (or in-memory) database
            let path = url.strip_prefix("file:").unwrap_or(url);
            Builder::new_local(path)
                .build()
                .await
                .context("Failed to open local database")?
        };

        let conn = db.connect().context("Failed to get database connection")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the database schema
    pub async fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS couples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user1_id INTEGER NOT NULL,
                user2_id INTEGER NOT NULL,
                user1_name TEXT NOT NULL,
                user2_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(user1_id, user2_id)
            )
            "#,
            (),
        )
        .await?;

        // One pet per couple
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS pets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                couple_id INTEGER NOT NULL UNIQUE REFERENCES couples(id),
                name TEXT NOT NULL,
                pet_type TEXT NOT NULL,
                hunger INTEGER NOT NULL DEFAULT 100,
                happiness INTEGER NOT NULL DEFAULT 100,
                energy INTEGER NOT NULL DEFAULT 100,
                level INTEGER NOT NULL DEFAULT 1,
                experience INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
            (),
        )
        .await?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pet_id INTEGER NOT NULL REFERENCES pets(id),
                user_id INTEGER NOT NULL,
                action_type TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
            (),
        )
        .await?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_actions_pet_timestamp ON actions(pet_id, timestamp DESC)",
            (),
        )
        .await?;

        info!("Database schema initialized");
        Ok(())
    }

    /// Register a pair of users, or refresh the names of an existing pair.
    ///
    /// The pair is matched in either order so (a, b) and (b, a) share a row.
    pub async fn upsert_couple(
        &self,
        user1_id: i64,
        user2_id: i64,
        user1_name: &str,
        user2_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Couple> {
        let conn = self.conn.lock().await;

        if let Some(mut existing) = query_couple_by_users(&conn, user1_id, user2_id).await? {
            // Keep names aligned with the stored column order
            let (name1, name2) = if existing.user1_id == user1_id {
                (user1_name, user2_name)
            } else {
                (user2_name, user1_name)
            };
            conn.execute(
                UPDATE_COUPLE_NAMES,
                params![name1.to_string(), name2.to_string(), existing.id],
            )
            .await?;
            existing.user1_name = name1.to_string();
            existing.user2_name = name2.to_string();
            debug!("Refreshed couple {}", existing.id);
            return Ok(existing);
        }

        let created_at = to_millis(now);
        conn.execute(
            r#"
            INSERT INTO couples (user1_id, user2_id, user1_name, user2_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user1_id,
                user2_id,
                user1_name.to_string(),
                user2_name.to_string(),
                created_at
            ],
        )
        .await?;
        let id = last_insert_id(&conn).await?;

        debug!("Added couple {id}: {user1_id} + {user2_id}");
        Ok(Couple {
            id,
            user1_id,
            user2_id,
            user1_name: user1_name.to_string(),
            user2_name: user2_name.to_string(),
            created_at: from_millis(created_at)?,
        })
    }

    pub async fn get_couple(&self, couple_id: i64) -> Result<Option<Couple>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {COUPLE_COLUMNS} FROM couples WHERE id = ?1");
        let mut rows = conn.query(&sql, params![couple_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(couple_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_couple(&self, user_a: i64, user_b: i64) -> Result<Option<Couple>> {
        let conn = self.conn.lock().await;
        query_couple_by_users(&conn, user_a, user_b).await
    }

    /// The first couple the user belongs to, in creation order.
    pub async fn find_user_couple(&self, user_id: i64) -> Result<Option<Couple>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {COUPLE_COLUMNS} FROM couples WHERE user1_id = ?1 OR user2_id = ?1 ORDER BY id LIMIT 1"
        );
        let mut rows = conn.query(&sql, params![user_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(couple_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn update_couple_names(
        &self,
        couple_id: i64,
        user1_name: &str,
        user2_name: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn
            .execute(
                UPDATE_COUPLE_NAMES,
                params![user1_name.to_string(), user2_name.to_string(), couple_id],
            )
            .await?;
        Ok(changed > 0)
    }

    pub async fn insert_pet(
        &self,
        couple_id: i64,
        name: &str,
        species: &str,
        now: DateTime<Utc>,
    ) -> Result<Pet> {
        let conn = self.conn.lock().await;
        let created_at = to_millis(now);

        conn.execute(
            r#"
            INSERT INTO pets (couple_id, name, pet_type, last_updated, created_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![couple_id, name.to_string(), species.to_string(), created_at],
        )
        .await?;
        let id = last_insert_id(&conn).await?;

        debug!("Added pet {id} ({species}) for couple {couple_id}");
        Ok(Pet::newborn(
            id,
            couple_id,
            name,
            species,
            from_millis(created_at)?,
        ))
    }

    pub async fn get_pet(&self, couple_id: i64) -> Result<Option<Pet>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {PET_COLUMNS} FROM pets WHERE couple_id = ?1");
        let mut rows = conn.query(&sql, params![couple_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(pet_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Partial update; returns whether a pet row was written.
    pub async fn update_pet_stats(
        &self,
        pet_id: i64,
        update: &StatUpdate,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        let conn = self.conn.lock().await;
        let changed = write_stats(&conn, pet_id, update, at).await?;
        debug!("Updated stats of pet {pet_id}");
        Ok(changed)
    }

    pub async fn log_action(
        &self,
        pet_id: i64,
        user_id: i64,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            INSERT_ACTION,
            params![pet_id, user_id, action.to_string(), to_millis(at)],
        )
        .await?;
        Ok(())
    }

    /// Writes post-action stats and the audit entry atomically.
    pub async fn apply_action(
        &self,
        pet_id: i64,
        update: &StatUpdate,
        user_id: i64,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await?;

        if !write_stats(&tx, pet_id, update, at).await? {
            tx.rollback().await?;
            anyhow::bail!("pet {pet_id} disappeared while applying {action}");
        }
        tx.execute(
            INSERT_ACTION,
            params![pet_id, user_id, action.to_string(), to_millis(at)],
        )
        .await?;
        tx.commit().await?;

        debug!("Pet {pet_id}: {action} by user {user_id} committed");
        Ok(())
    }

    /// Newest entries first.
    pub async fn recent_actions(&self, pet_id: i64, limit: usize) -> Result<Vec<ActionLogEntry>> {
        let conn = self.conn.lock().await;

        let mut rows = conn
            .query(
                r#"
                SELECT id, pet_id, user_id, action_type, timestamp
                FROM actions
                WHERE pet_id = ?1
                ORDER BY timestamp DESC, id DESC
                LIMIT ?2
                "#,
                params![pet_id, limit as i64],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: i64 = row.get(0)?;
            let pet_id: i64 = row.get(1)?;
            let user_id: i64 = row.get(2)?;
            let action: String = row.get(3)?;
            let timestamp: i64 = row.get(4)?;

            entries.push(ActionLogEntry {
                id,
                pet_id,
                user_id,
                action,
                timestamp: from_millis(timestamp)?,
            });
        }

        Ok(entries)
    }
}

async fn write_stats(
    conn: &Connection,
    pet_id: i64,
    update: &StatUpdate,
    at: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn
        .execute(
            UPDATE_PET_STATS,
            params![
                update.hunger.map(|v| i64::from(clamp_stat(i64::from(v)))),
                update.happiness.map(|v| i64::from(clamp_stat(i64::from(v)))),
                update.energy.map(|v| i64::from(clamp_stat(i64::from(v)))),
                update.level.map(i64::from),
                update.experience.map(i64::from),
                to_millis(at),
                pet_id,
            ],
        )
        .await?;
    Ok(changed > 0)
}

async fn query_couple_by_users(
    conn: &Connection,
    user_a: i64,
    user_b: i64,
) -> Result<Option<Couple>> {
    let sql = format!(
        "SELECT {COUPLE_COLUMNS} FROM couples WHERE (user1_id = ?1 AND user2_id = ?2) OR (user1_id = ?2 AND user2_id = ?1)"
    );
    let mut rows = conn.query(&sql, params![user_a, user_b]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(couple_from_row(&row)?)),
        None => Ok(None),
    }
}

async fn last_insert_id(conn: &Connection) -> Result<i64> {
    let mut rows = conn.query("SELECT last_insert_rowid()", ()).await?;
    let row = rows
        .next()
        .await?
        .context("last_insert_rowid returned no row")?;
    Ok(row.get(0)?)
}

fn couple_from_row(row: &Row) -> Result<Couple> {
    let created_at: i64 = row.get(5)?;
    Ok(Couple {
        id: row.get(0)?,
        user1_id: row.get(1)?,
        user2_id: row.get(2)?,
        user1_name: row.get(3)?,
        user2_name: row.get(4)?,
        created_at: from_millis(created_at)?,
    })
}

fn pet_from_row(row: &Row) -> Result<Pet> {
    let hunger: i64 = row.get(4)?;
    let happiness: i64 = row.get(5)?;
    let energy: i64 = row.get(6)?;
    let level: i64 = row.get(7)?;
    let experience: i64 = row.get(8)?;
    let last_updated: i64 = row.get(9)?;
    let created_at: i64 = row.get(10)?;

    Ok(Pet {
        id: row.get(0)?,
        couple_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        hunger: clamp_stat(hunger),
        happiness: clamp_stat(happiness),
        energy: clamp_stat(energy),
        level: u32::try_from(level.max(1)).context("pet level out of range")?,
        experience: u32::try_from(experience.max(0)).context("pet experience out of range")?,
        last_updated: from_millis(last_updated)?,
        created_at: from_millis(created_at)?,
    })
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .with_context(|| format!("timestamp {millis} out of range"))
}
