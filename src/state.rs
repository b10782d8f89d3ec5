use std::sync::Arc;

use crate::biometric::FaceEncoder;
use crate::config::RegulationSettings;
use crate::regulation::{
    Aggregator, CheckInEvaluator, Clock, IdentityValidator, ScheduleResolver,
};
use crate::store::AttendanceStore;
use crate::utils::descriptor_cache::DescriptorCache;

/// Services shared by every handler through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn AttendanceStore>,
    pub clock: Arc<dyn Clock>,
    pub resolver: ScheduleResolver,
    pub identity: Arc<IdentityValidator>,
    pub evaluator: CheckInEvaluator,
    pub aggregator: Arc<Aggregator>,
    pub reidentify_threshold: f64,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        encoder: Arc<dyn FaceEncoder>,
        clock: Arc<dyn Clock>,
        settings: &RegulationSettings,
    ) -> Self {
        let identity = Arc::new(IdentityValidator::new(
            store.clone(),
            encoder,
            DescriptorCache::new(settings.descriptor_cache_ttl),
            settings.face_tolerance,
        ));
        let evaluator = CheckInEvaluator::new(
            store.clone(),
            identity.clone(),
            clock.clone(),
            settings.checkin_match_threshold,
            settings.proof_dir.clone(),
        );

        Self {
            resolver: ScheduleResolver::new(store.clone()),
            aggregator: Arc::new(Aggregator::new(store.clone(), clock.clone())),
            store,
            clock,
            identity,
            evaluator,
            reidentify_threshold: settings.reidentify_threshold,
        }
    }
}
