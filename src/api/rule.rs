use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::model::{
    membership::{Membership, NewMembership},
    rule::{AttendanceEvent, NewEvent, NewRule, Rule},
};
use crate::state::AppState;
use crate::store::{AttendanceStore, StoreError};

#[derive(Debug, Serialize, ToSchema)]
pub struct RuleDetail {
    #[serde(flatten)]
    pub rule: Rule,
    pub events: Vec<AttendanceEvent>,
}

/// Maps a missing referenced entity to 400 instead of 404.
fn missing_reference(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound(what) => ApiError::BadRequest(format!("{what} does not exist")),
        other => other.into(),
    }
}

async fn check_references(store: &dyn AttendanceStore, rule: &NewRule) -> Result<(), ApiError> {
    if let Some(place_id) = rule.place_id {
        store.place(place_id).await.map_err(missing_reference)?;
    }
    for schedule_id in rule.week.0.iter().flatten() {
        store
            .day_schedule(*schedule_id)
            .await
            .map_err(missing_reference)?;
    }
    Ok(())
}

/// Create an attendance rule
#[utoipa::path(
    post,
    path = "/api/attendance-rules",
    request_body = NewRule,
    responses(
        (status = 201, description = "Rule created", body = Rule),
        (status = 400, description = "Invalid rule or unknown place/attendance time"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn create_rule(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewRule>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    payload.validate().map_err(ApiError::BadRequest)?;
    check_references(state.store.as_ref(), &payload).await?;

    let rule = state
        .store
        .create_rule(payload.into_inner(), state.clock.now())
        .await
        .map_err(ApiError::from)?;
    tracing::info!(rule_id = rule.id, by = %auth.username, "attendance rule created");
    Ok(HttpResponse::Created().json(rule))
}

/// Get a rule with its events
#[utoipa::path(
    get,
    path = "/api/attendance-rules/{id}",
    params(
        ("id" = u64, Path, description = "Rule id")
    ),
    responses(
        (status = 200, description = "Rule", body = RuleDetail),
        (status = 404, description = "Rule not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn get_rule(
    _auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let rule_id = path.into_inner();
    let rule = state.store.rule(rule_id).await.map_err(ApiError::from)?;
    let events = state
        .store
        .rule_events(rule_id)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(RuleDetail { rule, events }))
}

/// Assign a teacher to a rule as attendee or non-attendee
#[utoipa::path(
    post,
    path = "/api/attendance-rules/{id}/memberships",
    params(
        ("id" = u64, Path, description = "Rule id")
    ),
    request_body = NewMembership,
    responses(
        (status = 201, description = "Membership created", body = Membership),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Rule not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn add_membership(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<NewMembership>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let rule_id = path.into_inner();
    state.store.rule(rule_id).await.map_err(ApiError::from)?;

    let payload = payload.into_inner();
    let joined_on = payload.joined_on.unwrap_or_else(|| state.clock.now());
    let membership = state
        .store
        .add_membership(payload.teacher_id, rule_id, payload.kind, joined_on)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(
        teacher_id = membership.teacher_id,
        rule_id,
        kind = membership.kind.as_str(),
        by = %auth.username,
        "membership added"
    );
    Ok(HttpResponse::Created().json(membership))
}

/// Add an attendance event (holiday or make-up day) to a rule
#[utoipa::path(
    post,
    path = "/api/attendance-rules/{id}/events",
    params(
        ("id" = u64, Path, description = "Rule id")
    ),
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = AttendanceEvent),
        (status = 400, description = "start_date after end_date"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Rule not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn add_event(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<NewEvent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    payload.validate().map_err(ApiError::BadRequest)?;
    let rule_id = path.into_inner();
    state.store.rule(rule_id).await.map_err(ApiError::from)?;

    let event = state
        .store
        .add_event(rule_id, payload.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Created().json(event))
}
