use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{AstroRequest, AstroResponse, ScoreRequest};
use crate::routes::{ApiError, AppState};

/// Configure the stateless scoring routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/compat/score", web::post().to(score_readings))
        .route("/compat/astro", web::post().to(astro_compat));
}

/// POST /api/v1/compat/score
async fn score_readings(
    state: web::Data<AppState>,
    req: web::Json<ScoreRequest>,
) -> Result<HttpResponse, ApiError> {
    let scores = state.matcher.score(&req.reading1, &req.reading2);
    Ok(HttpResponse::Ok().json(scores))
}

/// POST /api/v1/compat/astro
async fn astro_compat(
    state: web::Data<AppState>,
    req: web::Json<AstroRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let astro = state.matcher.astro(&req.profile1, &req.profile2);
    Ok(HttpResponse::Ok().json(AstroResponse::from(astro)))
}
