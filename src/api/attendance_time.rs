use actix_web::{HttpResponse, Responder, web};

use super::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::model::schedule::{DaySchedule, NewDaySchedule};
use crate::state::AppState;

fn validate(schedule: &NewDaySchedule) -> Result<(), ApiError> {
    if schedule.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    for (index, slot) in schedule.slots.iter().enumerate() {
        slot.validate()
            .map_err(|e| ApiError::BadRequest(format!("slot {index}: {e}")))?;
    }
    Ok(())
}

/// Create an attendance time (a day schedule with its slots)
#[utoipa::path(
    post,
    path = "/api/attendance-times",
    request_body = NewDaySchedule,
    responses(
        (status = 201, description = "Attendance time created", body = DaySchedule),
        (status = 400, description = "Slot boundaries out of order", body = Object, example = json!({
            "code": "BAD_REQUEST",
            "message": "slot 0: start_open_time (08:40:00) must not be after open_time (08:30:00)"
        })),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn create_attendance_time(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewDaySchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    validate(&payload)?;

    let schedule = state
        .store
        .create_day_schedule(payload.into_inner())
        .await
        .map_err(ApiError::from)?;
    tracing::info!(
        schedule_id = schedule.id,
        slots = schedule.slots.len(),
        by = %auth.username,
        "attendance time created"
    );
    Ok(HttpResponse::Created().json(schedule))
}

/// List attendance times
#[utoipa::path(
    get,
    path = "/api/attendance-times",
    responses(
        (status = 200, description = "All attendance times with slots", body = [DaySchedule])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn list_attendance_times(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let schedules = state
        .store
        .list_day_schedules()
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(schedules))
}
