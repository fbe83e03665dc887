use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{
    CompareByCodeRequest, CompareByCodeResponse, IssueCodeRequest, IssueCodeResponse,
    ResolveCodeResponse,
};
use crate::routes::auth::CallerIdentity;
use crate::routes::{ApiError, AppState};
use crate::services::{AnalysisGenerator, TemplateAnalysisGenerator};

const NOT_DURABLE_WARNING: &str =
    "This code was saved on this server only and may not work from other devices.";

/// Configure all compatibility-code routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/codes", web::post().to(issue_code))
        .route("/codes/{code}", web::get().to(resolve_code))
        .route("/codes/{code}", web::delete().to(revoke_code))
        .route("/codes/{code}/compare", web::post().to(compare_by_code));
}

/// Issue a code for the caller's reading
///
/// POST /api/v1/codes
async fn issue_code(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    req: web::Json<IssueCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let IssueCodeRequest { reading_snapshot } = req.into_inner();

    let issued = state.broker.issue(&caller.0, reading_snapshot).await?;

    Ok(HttpResponse::Created().json(IssueCodeResponse {
        warning: (!issued.durable).then(|| NOT_DURABLE_WARNING.to_string()),
        code: issued.code,
        durable: issued.durable,
        expires_at: issued.expires_at,
    }))
}

/// Resolve a code to the reading it was issued for
///
/// GET /api/v1/codes/{code}
async fn resolve_code(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let resolved = state.broker.resolve(&path).await?;
    tracing::debug!("Code {} resolved by {}", resolved.record.code, caller.0.user_id);

    let record = resolved.record;
    Ok(HttpResponse::Ok().json(ResolveCodeResponse {
        issuer_name: record.issuer_name().to_string(),
        uses: record.uses,
        reading_snapshot: record.snapshot,
    }))
}

/// Deactivate a code
///
/// DELETE /api/v1/codes/{code}
async fn revoke_code(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.broker.revoke(&path, &caller.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Compare the caller against the reading bound to a code and record the match
///
/// POST /api/v1/codes/{code}/compare
///
/// Request body:
/// ```json
/// {
///   "readingSnapshot": { "displayName": "...", "reading": {...}, "profile": {...} },
///   "matchType": "romantic|friendship|platonic"
/// }
/// ```
async fn compare_by_code(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    req: web::Json<CompareByCodeRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let CompareByCodeRequest {
        reading_snapshot,
        match_type,
    } = req.into_inner();

    let resolved = state.broker.resolve_for(&path, &caller.0).await?;
    let issuer = resolved.record.issuer.clone();
    let theirs = &resolved.record.snapshot;

    let report = state.matcher.evaluate(theirs, &reading_snapshot);

    let pending = state
        .lifecycle
        .create_match(&issuer, &caller.0, match_type)
        .await?;

    // The narrative is optional polish; scores are already final
    let analysis = match state
        .analysis
        .generate(theirs, &reading_snapshot, &report, match_type)
        .await
    {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!("Analysis provider failed for match {}, using template: {}", pending.id, e);
            TemplateAnalysisGenerator
                .generate(theirs, &reading_snapshot, &report, match_type)
                .await?
        }
    };

    let completed = state
        .lifecycle
        .complete_match(pending.id, report.match_scores(), analysis)
        .await?;

    tracing::info!(
        "Compared {} with code {} (overall {})",
        caller.0.user_id,
        resolved.record.code,
        report.correlation.overall_score
    );

    Ok(HttpResponse::Created().json(CompareByCodeResponse {
        compat_match: completed,
        report,
    }))
}
