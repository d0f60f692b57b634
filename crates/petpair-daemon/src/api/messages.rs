use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    pet::{ActionLogEntry, ActionProfile, Couple, Pet, SpeciesProfile},
    service::{ActionReport, PetStatus},
};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoupleQuery {
    pub couple_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityQuery {
    pub couple_id: i64,
    pub action: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub couple_id: i64,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCoupleRequest {
    pub user1_id: i64,
    pub user2_id: i64,
    #[serde(default)]
    pub user1_name: Option<String>,
    #[serde(default)]
    pub user2_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePetRequest {
    pub couple_id: i64,
    #[serde(default)]
    pub pet_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub couple_id: i64,
    pub user_id: i64,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub species: BTreeMap<String, SpeciesProfile>,
    pub actions: BTreeMap<String, ActionProfile>,
    pub enforce_eligibility: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub has_couple: bool,
    pub couple_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoupleResponse {
    pub success: bool,
    pub couple_id: i64,
    pub couple: Couple,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetResponse<T> {
    pub success: bool,
    pub pet: T,
}

pub type PetStatusResponse = PetResponse<PetStatus>;
pub type PetCreatedResponse = PetResponse<Pet>;

#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ActionReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResponse {
    pub couple_id: i64,
    pub action: String,
    pub can_perform: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub actions: Vec<ActionLogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
