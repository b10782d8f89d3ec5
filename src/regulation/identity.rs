use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::error::{CheckInError, RejectReason};
use crate::biometric::{FaceEncoder, compare_many};
use crate::store::AttendanceStore;
use crate::utils::descriptor_cache::DescriptorCache;

/// Outcome of comparing one proof image against the enrolled set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct IdentityMatch {
    pub matches: usize,
    pub total: usize,
}

impl IdentityMatch {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matches as f64 / self.total as f64
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.total > 0 && self.ratio() >= threshold
    }
}

pub struct IdentityValidator {
    store: Arc<dyn AttendanceStore>,
    encoder: Arc<dyn FaceEncoder>,
    cache: DescriptorCache,
    tolerance: f64,
}

impl IdentityValidator {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        encoder: Arc<dyn FaceEncoder>,
        cache: DescriptorCache,
        tolerance: f64,
    ) -> Self {
        Self {
            store,
            encoder,
            cache,
            tolerance,
        }
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Accepts when at least `threshold` of the enrolled descriptors match the
    /// first face found in `image`.
    pub async fn verify(
        &self,
        teacher_id: u64,
        image: &[u8],
        threshold: f64,
    ) -> Result<IdentityMatch, CheckInError> {
        let stored = self.cache.get_or_load(teacher_id, self.store.as_ref()).await?;
        if stored.is_empty() {
            return Err(RejectReason::NoEnrollmentData.into());
        }

        let faces = self.encoder.extract(image).await?;
        let Some(query) = faces.into_iter().next() else {
            return Err(RejectReason::NoFaceDetected.into());
        };

        let total = stored.len();
        let tolerance = self.tolerance;
        let matches = actix_web::web::block(move || compare_many(&stored, &query, tolerance))
            .await
            .map_err(|e| CheckInError::Matcher(e.to_string()))?;

        let outcome = IdentityMatch { matches, total };
        if !outcome.passes(threshold) {
            tracing::info!(
                teacher_id,
                matches,
                total,
                threshold,
                "face did not match enrolled descriptors"
            );
            return Err(RejectReason::IdentityMismatch.into());
        }
        Ok(outcome)
    }
}
