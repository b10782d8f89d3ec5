use actix_web::{HttpResponse, Responder, web};

use super::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::model::place::{NewPlace, Place};
use crate::state::AppState;

/// Register an attendance place
#[utoipa::path(
    post,
    path = "/api/attendance-places",
    request_body = NewPlace,
    responses(
        (status = 201, description = "Place created", body = Place),
        (status = 400, description = "Invalid coordinates"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn create_place(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewPlace>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let place = state
        .store
        .create_place(payload.into_inner())
        .await
        .map_err(ApiError::from)?;
    tracing::info!(place_id = place.id, by = %auth.username, "attendance place created");
    Ok(HttpResponse::Created().json(place))
}

/// List attendance places
#[utoipa::path(
    get,
    path = "/api/attendance-places",
    responses(
        (status = 200, description = "All places", body = [Place])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn list_places(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let places = state.store.list_places().await.map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(places))
}
