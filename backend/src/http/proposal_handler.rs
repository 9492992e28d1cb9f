use crate::api_error::ApiError;
use crate::auth::middleware::ClaimsExt;
use crate::models::match_proposal::{CreateProposalDto, RefixPolicy};
use crate::service::{ProfileService, ProposalLifecycleService, RecordAggregatorService};
use crate::store::{EntityStore, StoreHealth};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Application state shared by all handlers
pub struct AppState {
    pub lifecycle: Arc<ProposalLifecycleService>,
    pub records: RecordAggregatorService,
    pub profiles: Arc<ProfileService>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Wire every service against one backend
    pub fn from_store<S: EntityStore + 'static>(store: Arc<S>, refix_policy: RefixPolicy) -> Self {
        let records = RecordAggregatorService::new(store.clone());
        Self {
            lifecycle: Arc::new(ProposalLifecycleService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                refix_policy,
            )),
            profiles: Arc::new(ProfileService::new(
                store.clone(),
                store.clone(),
                records.clone(),
            )),
            records,
            health: store,
        }
    }
}

// =============================================================================
// PROPOSE
// =============================================================================

/// POST /api/matches/{match_id}/proposals
/// Propose a match as the authenticated user
pub async fn propose(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CreateProposalDto>,
) -> Result<impl Responder, ApiError> {
    let match_id = path.into_inner();
    let user_id = req.user_id().ok_or(ApiError::Unauthorized)?;

    info!(match_id = %match_id, user_id = %user_id, "Received propose request");

    let proposal = state
        .lifecycle
        .propose(user_id, match_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(proposal))
}

// =============================================================================
// FIX
// =============================================================================

/// PATCH /api/proposals/{id}/fixed
pub async fn fix_proposal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let proposal_id = path.into_inner();

    info!(
        proposal_id = %proposal_id,
        caller = ?req.user_id(),
        "Received fix proposal request"
    );

    let result = state.lifecycle.fix(proposal_id).await?;

    Ok(HttpResponse::Ok().json(result))
}

// =============================================================================
// QUERIES
// =============================================================================

/// GET /api/proposals/{id}
pub async fn get_proposal_summary(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let result = state.lifecycle.find_summary(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/proposals/{id}/transitions
pub async fn get_proposal_transitions(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let result = state.lifecycle.transitions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/teams/{id}/records
pub async fn get_team_records(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let result = state.records.totals_for_team(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/users/{id}/profile
pub async fn get_user_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let result = state.profiles.find_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

// =============================================================================
// ROUTE CONFIGURATION
// =============================================================================

/// Routes that require an authenticated caller; mount under the auth middleware
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches/{match_id}/proposals", web::post().to(propose))
        .route("/proposals/{id}", web::get().to(get_proposal_summary))
        .route("/proposals/{id}/fixed", web::patch().to(fix_proposal))
        .route(
            "/proposals/{id}/transitions",
            web::get().to(get_proposal_transitions),
        )
        .route("/teams/{id}/records", web::get().to(get_team_records))
        .route("/users/{id}/profile", web::get().to(get_user_profile));
}
