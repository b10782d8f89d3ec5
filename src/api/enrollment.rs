use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::state::AppState;

/// Drop cached face descriptors after the enrollment pipeline changed them
#[utoipa::path(
    post,
    path = "/api/teachers/{id}/face-descriptors/refresh",
    params(
        ("id" = u64, Path, description = "Teacher id")
    ),
    responses(
        (status = 204, description = "Cache entry dropped"),
        (status = 403, description = "Admin/System only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Configuration"
)]
pub async fn refresh_descriptors(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin_or_system()?;
    let teacher_id = path.into_inner();
    state.identity.cache().invalidate(teacher_id).await;
    tracing::info!(teacher_id, by = %auth.username, "face descriptor cache invalidated");
    Ok(HttpResponse::NoContent().finish())
}
