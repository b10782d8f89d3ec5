use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use super::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::model::summary::DailySummary;
use crate::regulation::aggregator::RunReport;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    #[param(example = "2026-03-01", value_type = String, format = "date")]
    pub from: NaiveDate,
    #[param(example = "2026-03-31", value_type = String, format = "date")]
    pub to: NaiveDate,
    /// Admins may ask for any teacher, or omit it for everyone
    pub teacher_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RunQuery {
    #[param(example = "2026-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
}

/// Daily attendance summaries
#[utoipa::path(
    get,
    path = "/api/attendance/summaries",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Summaries in range", body = [DailySummary]),
        (status = 400, description = "Invalid range"),
        (status = 403, description = "Asked for another teacher without admin role")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn list_summaries(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    if query.from > query.to {
        return Err(ApiError::BadRequest("from cannot be after to".into()).into());
    }

    let teacher_id = if auth.is_admin() {
        query.teacher_id
    } else {
        let own = auth.require_teacher()?;
        if query.teacher_id.is_some_and(|requested| requested != own) {
            return Err(actix_web::error::ErrorForbidden("Admin only"));
        }
        Some(own)
    };

    let summaries = state
        .store
        .summaries_between(teacher_id, query.from, query.to)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// Summarize one elapsed date now instead of waiting for the daily run
#[utoipa::path(
    post,
    path = "/api/attendance/summaries/run",
    params(RunQuery),
    responses(
        (status = 200, description = "Run report", body = Object, example = json!({
            "inserted": 40, "already_summarized": 2, "ungoverned": 3, "skipped": 0, "failed": 0
        })),
        (status = 400, description = "Date has not elapsed yet"),
        (status = 403, description = "Admin/System only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn run_summaries(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RunQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_system()?;
    if query.date >= state.clock.today() {
        return Err(ApiError::BadRequest("only elapsed dates can be summarized".into()).into());
    }

    let report: RunReport = state.aggregator.summarize_date(query.date).await;
    tracing::info!(user_id = auth.user_id, date = %query.date, ?report, "summaries run on demand");
    Ok(HttpResponse::Ok().json(report))
}
