use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::model::{
    check_in::CheckInRecord,
    place::Position,
    schedule::DaySchedule,
    time_slot::Direction,
};
use crate::regulation::{CheckInRequest, DayPlan, Resolution, identity::IdentityMatch};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CheckInQuery {
    #[param(example = 12)]
    pub time_slot_id: u64,
    /// `true` opens the slot, `false` closes it
    pub is_open_attend: bool,
    #[param(example = 31.2304)]
    pub latitude: f64,
    #[param(example = 121.4737)]
    pub longitude: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRange {
    #[param(example = "2026-03-01", value_type = String, format = "date")]
    pub from: NaiveDate,
    #[param(example = "2026-03-31", value_type = String, format = "date")]
    pub to: NaiveDate,
}

impl DateRange {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.from > self.to {
            return Err(ApiError::BadRequest("from cannot be after to".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentReq {
    #[schema(example = "Phone battery died, checked in from the front desk")]
    pub comment: String,
}

/// What today looks like for the caller.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Ungoverned,
    Exempt,
    Off,
    Suspended,
    Attend,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: DayStatus,
    pub rule_id: Option<u64>,
    /// Set when a must-day or an attendance event turned the day on
    pub forced: bool,
    pub schedule: Option<DaySchedule>,
}

impl TodayResponse {
    fn new(date: NaiveDate, resolution: Resolution) -> Self {
        let forced = matches!(
            resolution,
            Resolution::Governed {
                plan: DayPlan::Attend { forced: true, .. },
                ..
            }
        );
        let (status, rule_id, schedule) = match resolution {
            Resolution::Ungoverned => (DayStatus::Ungoverned, None, None),
            Resolution::Exempt { rule, .. } => (DayStatus::Exempt, Some(rule.id), None),
            Resolution::Governed {
                rule,
                plan,
                schedule,
                ..
            } => {
                let status = match (plan, &schedule) {
                    (DayPlan::Suspended, _) => DayStatus::Suspended,
                    (DayPlan::Attend { .. }, Some(_)) => DayStatus::Attend,
                    _ => DayStatus::Off,
                };
                (status, Some(rule.id), schedule)
            }
        };
        Self {
            date,
            status,
            rule_id,
            forced,
            schedule,
        }
    }
}

fn require_image(body: &web::Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("proof image is required".into()));
    }
    Ok(())
}

/// Submit a check-in
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    params(CheckInQuery),
    request_body(content = Vec<u8>, content_type = "image/jpeg", description = "Proof photo"),
    responses(
        (status = 201, description = "Check-in accepted", body = CheckInRecord),
        (status = 400, description = "Time slot not scheduled today / missing image / invalid position", body = Object, example = json!({
            "code": "TIMESLOT_MISSING",
            "message": "This time slot is not scheduled today"
        })),
        (status = 403, description = "Face does not match", body = Object, example = json!({
            "code": "IDENTITY_MISMATCH",
            "message": "Face does not match the enrolled profile"
        })),
        (status = 409, description = "No attendance expected today"),
        (status = 412, description = "No face data enrolled"),
        (status = 422, description = "Outside the window / no face in image"),
        (status = 503, description = "Face encoder unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<CheckInQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.require_teacher()?;
    require_image(&body)?;

    let query = query.into_inner();
    let position = Position {
        latitude: query.latitude,
        longitude: query.longitude,
    };
    position.validate().map_err(ApiError::BadRequest)?;

    let request = CheckInRequest {
        teacher_id,
        time_slot_id: query.time_slot_id,
        direction: Direction::from_open_flag(query.is_open_attend),
        position,
        proof_image: body.to_vec(),
    };

    let record = state
        .evaluator
        .submit(request)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Created().json(record))
}

/// One-shot re-identification against enrolled faces
#[utoipa::path(
    post,
    path = "/api/attendance/identify",
    request_body(content = Vec<u8>, content_type = "image/jpeg", description = "Photo to verify"),
    responses(
        (status = 200, description = "Identity confirmed", body = IdentityMatch),
        (status = 403, description = "Face does not match"),
        (status = 412, description = "No face data enrolled"),
        (status = 422, description = "No face in image")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn identify(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.require_teacher()?;
    require_image(&body)?;

    let outcome = state
        .identity
        .verify(teacher_id, &body, state.reidentify_threshold)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Today's schedule for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Resolved schedule", body = TodayResponse),
        (status = 403, description = "No teacher profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.require_teacher()?;
    let date = state.clock.today();

    let resolution = state
        .resolver
        .resolve(teacher_id, date)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(TodayResponse::new(date, resolution)))
}

/// Own check-in history
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(DateRange),
    responses(
        (status = 200, description = "Check-in records", body = [CheckInRecord]),
        (status = 400, description = "Invalid range")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    state: web::Data<AppState>,
    range: web::Query<DateRange>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.require_teacher()?;
    range.validate()?;

    let records = state
        .store
        .check_ins_between(teacher_id, range.from, range.to)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(records))
}

/// Append a comment to one of the caller's check-ins
#[utoipa::path(
    put,
    path = "/api/attendance/history/{id}/comment",
    params(
        ("id" = u64, Path, description = "Check-in record id")
    ),
    request_body = CommentReq,
    responses(
        (status = 200, description = "Updated record", body = CheckInRecord),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "No such record for the caller")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn append_comment(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<CommentReq>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.require_teacher()?;
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(ApiError::BadRequest("comment must not be empty".into()).into());
    }

    let record = state
        .store
        .append_comment(path.into_inner(), teacher_id, comment)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(record))
}
