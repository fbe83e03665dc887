use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CompleteMatchRequest, CreateInvitationRequest, CreateInvitationResponse, CreateMatchRequest,
    DiscoverQuery, DiscoverResponse, HealthResponse, InvitationResponse, MatchResponse,
    PublishResponse, SweepResponse,
};
use crate::routes::auth::CallerIdentity;
use crate::routes::{ApiError, AppState};

/// Discovery feed never returns more than this many entries
const MAX_FEED_LIMIT: u16 = 100;

/// Configure invitation, match and maintenance routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/maintenance/sweep", web::post().to(sweep))
        .route("/invitations", web::post().to(create_invitation))
        .route("/invitations/{code}/accept", web::post().to(accept_invitation))
        .route("/matches", web::post().to(create_match))
        .route("/matches/{id}", web::get().to(get_match))
        .route("/matches/{id}/complete", web::put().to(complete_match))
        .route("/matches/{id}/publish", web::post().to(publish_match))
        .route("/discover", web::get().to(discover));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.lifecycle.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Purge expired codes and expire overdue invitations
///
/// POST /api/v1/maintenance/sweep
async fn sweep(state: web::Data<AppState>, _caller: CallerIdentity) -> Result<HttpResponse, ApiError> {
    let codes_purged = state.broker.sweep_expired().await?;
    let invitations_expired = state.lifecycle.expire_invitations().await?;

    Ok(HttpResponse::Ok().json(SweepResponse {
        codes_purged,
        invitations_expired,
    }))
}

/// POST /api/v1/invitations
async fn create_invitation(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    req: web::Json<CreateInvitationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let CreateInvitationRequest {
        match_type,
        message,
    } = req.into_inner();

    let invitation = state
        .lifecycle
        .create_invitation(&caller.0, match_type, message)
        .await?;

    Ok(HttpResponse::Created().json(CreateInvitationResponse {
        invite_code: invitation.invite_code,
        expires_at: invitation.expires_at,
    }))
}

/// POST /api/v1/invitations/{code}/accept
async fn accept_invitation(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let invitation = state.lifecycle.accept(&path, &caller.0).await?;
    Ok(HttpResponse::Ok().json(InvitationResponse { invitation }))
}

/// Create a pending match; the caller must be one of the two parties
///
/// POST /api/v1/matches
async fn create_match(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    req: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let caller_id = &caller.0.user_id;
    if &req.party_a.user_id != caller_id && &req.party_b.user_id != caller_id {
        return Err(crate::services::LifecycleError::NotParticipant.into());
    }

    let compat_match = state
        .lifecycle
        .create_match(&req.party_a, &req.party_b, req.match_type)
        .await?;

    Ok(HttpResponse::Created().json(MatchResponse { compat_match }))
}

/// GET /api/v1/matches/{id}
async fn get_match(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let compat_match = state.lifecycle.get_match(path.into_inner(), &caller.0).await?;
    Ok(HttpResponse::Ok().json(MatchResponse { compat_match }))
}

/// Attach scores and analysis
///
/// PUT /api/v1/matches/{id}/complete
async fn complete_match(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    req: web::Json<CompleteMatchRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let id = path.into_inner();

    // Visibility check first so strangers cannot learn match state
    let current = state.lifecycle.get_match(id, &caller.0).await?;
    if !current.involves(&caller.0.user_id) {
        return Err(crate::services::LifecycleError::NotParticipant.into());
    }

    let CompleteMatchRequest { scores, analysis } = req.into_inner();
    let compat_match = state.lifecycle.complete_match(id, scores, analysis).await?;

    Ok(HttpResponse::Ok().json(MatchResponse { compat_match }))
}

/// POST /api/v1/matches/{id}/publish
async fn publish_match(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let published = state.lifecycle.publish(path.into_inner(), &caller.0).await?;

    Ok(HttpResponse::Ok().json(PublishResponse {
        compat_match: published.compat_match,
        summary: published.summary,
    }))
}

/// Public discovery feed, newest first
///
/// GET /api/v1/discover?limit=20
async fn discover(
    state: web::Data<AppState>,
    query: web::Query<DiscoverQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.clamp(1, MAX_FEED_LIMIT) as usize;
    let matches = state.lifecycle.public_feed(limit).await?;

    Ok(HttpResponse::Ok().json(DiscoverResponse {
        total: matches.len(),
        matches,
    }))
}
