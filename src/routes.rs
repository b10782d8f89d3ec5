use crate::{
    api::{attendance, attendance_time, enrollment, place, rule, summary},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Largest accepted proof image.
const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let checkin_limiter = Arc::new(build_limiter(config.rate_checkin_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in")
                            .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
                            .wrap(checkin_limiter)
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/identify
                    .service(
                        web::resource("/identify")
                            .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
                            .route(web::post().to(attendance::identify)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(
                        web::resource("/history").route(web::get().to(attendance::history)),
                    )
                    // /attendance/history/{id}/comment
                    .service(
                        web::resource("/history/{id}/comment")
                            .route(web::put().to(attendance::append_comment)),
                    )
                    .service(
                        web::resource("/summaries")
                            .route(web::get().to(summary::list_summaries)),
                    )
                    .service(
                        web::resource("/summaries/run")
                            .route(web::post().to(summary::run_summaries)),
                    ),
            )
            .service(
                web::resource("/attendance-places")
                    .route(web::post().to(place::create_place))
                    .route(web::get().to(place::list_places)),
            )
            .service(
                web::resource("/attendance-times")
                    .route(web::post().to(attendance_time::create_attendance_time))
                    .route(web::get().to(attendance_time::list_attendance_times)),
            )
            .service(
                web::scope("/attendance-rules")
                    // /attendance-rules
                    .service(web::resource("").route(web::post().to(rule::create_rule)))
                    // /attendance-rules/{id}
                    .service(web::resource("/{id}").route(web::get().to(rule::get_rule)))
                    .service(
                        web::resource("/{id}/memberships")
                            .route(web::post().to(rule::add_membership)),
                    )
                    .service(
                        web::resource("/{id}/events").route(web::post().to(rule::add_event)),
                    ),
            )
            .service(
                web::resource("/teachers/{id}/face-descriptors/refresh")
                    .route(web::post().to(enrollment::refresh_descriptors)),
            ),
    );
}
