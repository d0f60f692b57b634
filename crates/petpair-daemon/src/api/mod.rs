//! JSON-over-HTTP surface for the mini-app.

mod error;
mod messages;

use std::future::Future;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::Method,
    routing::{get, post},
};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::ServerConfig,
    service::{NewCouple, PetService},
};

pub use error::ApiError;
pub use messages::*;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Builds the application router.
pub fn router(service: PetService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(catalog))
        .route("/api/user", get(get_user))
        .route("/api/couple", get(get_couple))
        .route("/api/couple/create", post(create_couple))
        .route("/api/pet", get(get_pet))
        .route("/api/pet/create", post(create_pet))
        .route("/api/pet/action", post(pet_action))
        .route("/api/pet/can_perform", get(can_perform))
        .route("/api/pet/actions", get(pet_actions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Serves until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    service: PetService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn catalog(State(service): State<PetService>) -> Json<CatalogResponse> {
    let rules = service.rules();
    Json(CatalogResponse {
        species: rules.species_catalog().clone(),
        actions: rules.action_catalog().clone(),
        enforce_eligibility: rules.enforce_eligibility(),
    })
}

async fn get_user(
    State(service): State<PetService>,
    query: std::result::Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<UserResponse> {
    let Query(query) = query?;
    let couple = service.user_couple(query.user_id).await?;
    Ok(Json(UserResponse {
        user_id: query.user_id,
        has_couple: couple.is_some(),
        couple_id: couple.map(|c| c.id),
    }))
}

async fn get_couple(
    State(service): State<PetService>,
    query: std::result::Result<Query<CoupleQuery>, QueryRejection>,
) -> ApiResult<CoupleResponse> {
    let Query(query) = query?;
    let couple = service.couple(query.couple_id).await?;
    Ok(Json(CoupleResponse {
        success: true,
        couple_id: couple.id,
        couple,
    }))
}

async fn create_couple(
    State(service): State<PetService>,
    body: std::result::Result<Json<CreateCoupleRequest>, JsonRejection>,
) -> ApiResult<CoupleResponse> {
    let Json(request) = body?;
    let couple = service
        .create_couple(
            NewCouple {
                user1_id: request.user1_id,
                user2_id: request.user2_id,
                user1_name: request.user1_name,
                user2_name: request.user2_name,
            },
            Utc::now(),
        )
        .await?;
    Ok(Json(CoupleResponse {
        success: true,
        couple_id: couple.id,
        couple,
    }))
}

async fn get_pet(
    State(service): State<PetService>,
    query: std::result::Result<Query<CoupleQuery>, QueryRejection>,
) -> ApiResult<PetStatusResponse> {
    let Query(query) = query?;
    let status = service.pet_status(query.couple_id, Utc::now()).await?;
    Ok(Json(PetResponse {
        success: true,
        pet: status,
    }))
}

async fn create_pet(
    State(service): State<PetService>,
    body: std::result::Result<Json<CreatePetRequest>, JsonRejection>,
) -> ApiResult<PetCreatedResponse> {
    let Json(request) = body?;
    let pet = service
        .create_pet(request.couple_id, request.pet_type, request.name, Utc::now())
        .await?;
    Ok(Json(PetResponse { success: true, pet }))
}

async fn pet_action(
    State(service): State<PetService>,
    body: std::result::Result<Json<ActionRequest>, JsonRejection>,
) -> ApiResult<ActionResponse> {
    let Json(request) = body?;
    let report = service
        .perform_action(
            request.couple_id,
            request.user_id,
            &request.action,
            Utc::now(),
        )
        .await?;
    Ok(Json(ActionResponse {
        success: true,
        report,
    }))
}

async fn can_perform(
    State(service): State<PetService>,
    query: std::result::Result<Query<EligibilityQuery>, QueryRejection>,
) -> ApiResult<EligibilityResponse> {
    let Query(query) = query?;
    let can_perform = service
        .can_perform_action(query.couple_id, &query.action, Utc::now())
        .await?;
    Ok(Json(EligibilityResponse {
        couple_id: query.couple_id,
        action: query.action,
        can_perform,
    }))
}

async fn pet_actions(
    State(service): State<PetService>,
    query: std::result::Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<HistoryResponse> {
    let Query(query) = query?;
    let actions = service
        .recent_actions(query.couple_id, query.limit())
        .await?;
    Ok(Json(HistoryResponse {
        success: true,
        actions,
    }))
}
