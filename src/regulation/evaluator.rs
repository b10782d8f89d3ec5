//! Check-in evaluation: every attempt ends in exactly one persisted record or
//! one typed rejection, never both.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{error, info, warn};

use super::clock::Clock;
use super::error::{CheckInError, RejectReason};
use super::geofence;
use super::identity::IdentityValidator;
use super::schedule::{Resolution, ScheduleResolver};
use crate::model::{
    check_in::{CheckInRecord, NewCheckIn},
    place::{Place, Position},
    time_slot::{Direction, TimeSlot},
};
use crate::store::{AttendanceStore, StoreError};

/// Everything one attempt carries. The time is never part of it.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub teacher_id: u64,
    pub time_slot_id: u64,
    pub direction: Direction,
    pub position: Position,
    pub proof_image: Vec<u8>,
}

/// Returns whether a check at `at` is bad (late open or early close), or
/// rejects it when it falls outside the slot's window for `direction`.
pub fn classify(slot: &TimeSlot, direction: Direction, at: NaiveTime) -> Result<bool, RejectReason> {
    let (start, finish) = slot.window(direction);
    if at < start || at > finish {
        return Err(RejectReason::OutOfAttendanceTime);
    }
    let expected = slot.expected(direction);
    Ok(match direction {
        Direction::Open => at > expected,
        Direction::Close => at < expected,
    })
}

pub struct CheckInEvaluator {
    store: Arc<dyn AttendanceStore>,
    resolver: ScheduleResolver,
    identity: Arc<IdentityValidator>,
    clock: Arc<dyn Clock>,
    match_threshold: f64,
    proof_dir: Option<PathBuf>,
}

impl CheckInEvaluator {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        identity: Arc<IdentityValidator>,
        clock: Arc<dyn Clock>,
        match_threshold: f64,
        proof_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            resolver: ScheduleResolver::new(store.clone()),
            store,
            identity,
            clock,
            match_threshold,
            proof_dir,
        }
    }

    pub async fn submit(&self, request: CheckInRequest) -> Result<CheckInRecord, CheckInError> {
        let result = self.evaluate(&request).await;
        match &result {
            Ok(record) => info!(
                teacher_id = request.teacher_id,
                record_id = record.id,
                time_slot_id = record.time_slot_id,
                is_open_attend = record.is_open_attend,
                is_bad_attendance = record.is_bad_attendance,
                "check-in accepted"
            ),
            Err(CheckInError::Rejected(reason)) => info!(
                teacher_id = request.teacher_id,
                time_slot_id = request.time_slot_id,
                reason = reason.as_ref(),
                "check-in rejected"
            ),
            Err(e) => error!(teacher_id = request.teacher_id, "check-in failed: {e}"),
        }
        result
    }

    async fn evaluate(&self, request: &CheckInRequest) -> Result<CheckInRecord, CheckInError> {
        let now = self.clock.now();

        let (membership, rule, schedule) = match self
            .resolver
            .resolve(request.teacher_id, now.date())
            .await?
        {
            Resolution::Governed {
                membership,
                rule,
                schedule: Some(schedule),
                ..
            } => (membership, rule, schedule),
            _ => return Err(RejectReason::NoAttendanceDay.into()),
        };

        let slot = schedule
            .slot(request.time_slot_id)
            .ok_or(RejectReason::TimeSlotMissing)?;
        let is_bad_attendance = classify(slot, request.direction, now.time())?;

        self.identity
            .verify(request.teacher_id, &request.proof_image, self.match_threshold)
            .await?;

        let place = self.rule_place(rule.place_id).await?;
        let is_right_place = geofence::validate(place.as_ref(), request.position);
        if !is_right_place {
            warn!(
                teacher_id = request.teacher_id,
                latitude = request.position.latitude,
                longitude = request.position.longitude,
                "check-in outside the attendance place"
            );
        }

        let image = self.archive_proof(&request.proof_image).await?;
        let record = NewCheckIn {
            membership_id: membership.id,
            teacher_id: request.teacher_id,
            time_slot_id: slot.id,
            is_open_attend: request.direction.is_open(),
            identified_on: now,
            latitude: request.position.latitude,
            longitude: request.position.longitude,
            is_right_place,
            is_bad_attendance,
            image: image.clone(),
            comment: None,
        };

        match self.store.insert_check_in(record).await {
            Ok(record) => Ok(record),
            Err(e) => {
                self.discard_proof(image.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// A dangling place reference is treated as unrestricted.
    async fn rule_place(&self, place_id: Option<u64>) -> Result<Option<Place>, CheckInError> {
        let Some(place_id) = place_id else {
            return Ok(None);
        };
        match self.store.place(place_id).await {
            Ok(place) => Ok(Some(place)),
            Err(StoreError::NotFound(_)) => {
                warn!(place_id, "rule references a missing place");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn archive_proof(&self, image: &[u8]) -> Result<Option<String>, CheckInError> {
        let Some(dir) = &self.proof_dir else {
            return Ok(None);
        };
        tokio::fs::create_dir_all(dir).await?;
        let file_name = format!("{}.jpg", uuid::Uuid::new_v4());
        tokio::fs::write(dir.join(&file_name), image).await?;
        Ok(Some(file_name))
    }

    async fn discard_proof(&self, file_name: Option<&str>) {
        if let (Some(dir), Some(file_name)) = (&self.proof_dir, file_name) {
            if let Err(e) = tokio::fs::remove_file(dir.join(file_name)).await {
                warn!("could not remove orphaned proof {file_name}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod evaluator_tests {
    use std::time::Duration;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::biometric::{Descriptor, ScriptedEncoder};
    use crate::model::membership::MembershipKind;
    use crate::model::place::NewPlace;
    use crate::model::schedule::{DaySchedule, WeekTemplate};
    use crate::model::time_slot::hm;
    use crate::regulation::clock::FixedClock;
    use crate::regulation::schedule::schedule_tests::{
        at, day, morning_slot, new_rule, weekday_rule,
    };
    use crate::store::memory::MemoryStore;
    use crate::utils::descriptor_cache::DescriptorCache;

    const TEACHER: u64 = 42;
    // Campus centre; 500 m north is about 0.0045 degrees of latitude
    const CAMPUS: Position = Position {
        latitude: 31.2304,
        longitude: 121.4737,
    };
    const FAR_AWAY: Position = Position {
        latitude: 31.2349,
        longitude: 121.4737,
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        rule_id: u64,
        schedule: DaySchedule,
        encoder: Arc<ScriptedEncoder>,
    }

    impl Fixture {
        /// Teacher enrolled, on a weekday rule with a 100 m geofence.
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let place = store
                .create_place(NewPlace {
                    name: "Campus".into(),
                    address: "1 Road".into(),
                    latitude: CAMPUS.latitude,
                    longitude: CAMPUS.longitude,
                    radius: 100,
                })
                .await
                .unwrap();
            let mut rule = new_rule("Teaching", WeekTemplate::default());
            rule.place_id = Some(place.id);
            rule.attendees = vec![TEACHER];
            let (rule, schedule) = weekday_rule(&store, rule).await;
            store.enroll(TEACHER, Descriptor(vec![0.0, 0.0]));
            let encoder = Arc::new(ScriptedEncoder::returning(vec![Descriptor(vec![0.1, 0.0])]));
            Self {
                store,
                rule_id: rule.id,
                schedule,
                encoder,
            }
        }

        fn evaluator(&self, now: NaiveDateTime) -> CheckInEvaluator {
            let identity = IdentityValidator::new(
                self.store.clone(),
                self.encoder.clone(),
                DescriptorCache::new(Duration::from_secs(60)),
                0.5,
            );
            CheckInEvaluator::new(
                self.store.clone(),
                Arc::new(identity),
                Arc::new(FixedClock(now)),
                0.2,
                None,
            )
        }

        fn morning_slot(&self) -> u64 {
            self.schedule.slots[0].id
        }

        fn request(&self, direction: Direction, position: Position) -> CheckInRequest {
            CheckInRequest {
                teacher_id: TEACHER,
                time_slot_id: self.morning_slot(),
                direction,
                position,
                proof_image: b"jpeg".to_vec(),
            }
        }
    }

    // 2024-03-04 is a Monday
    fn monday(hour: u32, minute: u32) -> NaiveDateTime {
        at(day(2024, 3, 4), hour, minute)
    }

    #[test]
    fn classify_window_edges() {
        let slot = TimeSlot::new(1, morning_slot()).unwrap();
        assert_eq!(classify(&slot, Direction::Open, hm(8, 0)), Ok(false));
        assert_eq!(classify(&slot, Direction::Open, hm(8, 30)), Ok(false));
        assert_eq!(classify(&slot, Direction::Open, hm(8, 45)), Ok(true));
        assert_eq!(classify(&slot, Direction::Open, hm(9, 0)), Ok(true));
        assert_eq!(
            classify(&slot, Direction::Open, hm(9, 15)),
            Err(RejectReason::OutOfAttendanceTime)
        );
        assert_eq!(
            classify(&slot, Direction::Open, hm(7, 59)),
            Err(RejectReason::OutOfAttendanceTime)
        );

        assert_eq!(classify(&slot, Direction::Close, hm(11, 15)), Ok(true));
        assert_eq!(classify(&slot, Direction::Close, hm(11, 30)), Ok(false));
        assert_eq!(classify(&slot, Direction::Close, hm(12, 0)), Ok(false));
        assert_eq!(
            classify(&slot, Direction::Close, hm(8, 30)),
            Err(RejectReason::OutOfAttendanceTime)
        );
    }

    #[actix_web::test]
    async fn late_open_is_accepted_and_flagged() {
        let fx = Fixture::new().await;
        let record = fx
            .evaluator(monday(8, 45))
            .submit(fx.request(Direction::Open, CAMPUS))
            .await
            .unwrap();
        assert!(record.is_bad_attendance);
        assert!(record.is_open_attend);
        assert!(record.is_right_place);
        assert_eq!(record.identified_on, monday(8, 45));
        assert_eq!(fx.store.history_len(), 1);
    }

    #[actix_web::test]
    async fn outside_window_is_rejected_without_record() {
        let fx = Fixture::new().await;
        let err = fx
            .evaluator(monday(9, 15))
            .submit(fx.request(Direction::Open, CAMPUS))
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::OutOfAttendanceTime));
        assert_eq!(fx.store.history_len(), 0);
        // Time is checked before identity
        assert_eq!(fx.encoder.calls(), 0);
    }

    #[actix_web::test]
    async fn geofence_flags_but_never_blocks() {
        let fx = Fixture::new().await;
        let record = fx
            .evaluator(monday(8, 20))
            .submit(fx.request(Direction::Open, FAR_AWAY))
            .await
            .unwrap();
        assert!(!record.is_right_place);
        assert!(!record.is_bad_attendance);
    }

    #[actix_web::test]
    async fn weekend_is_no_attendance_day() {
        let fx = Fixture::new().await;
        let saturday = at(day(2024, 3, 9), 8, 20);
        let err = fx
            .evaluator(saturday)
            .submit(fx.request(Direction::Open, CAMPUS))
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::NoAttendanceDay));
    }

    #[actix_web::test]
    async fn ungoverned_teacher_is_no_attendance_day() {
        let fx = Fixture::new().await;
        let mut request = fx.request(Direction::Open, CAMPUS);
        request.teacher_id = 999;
        let err = fx
            .evaluator(monday(8, 20))
            .submit(request)
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::NoAttendanceDay));
    }

    #[actix_web::test]
    async fn unknown_slot_is_missing() {
        let fx = Fixture::new().await;
        let mut request = fx.request(Direction::Open, CAMPUS);
        request.time_slot_id = 10_000;
        let err = fx
            .evaluator(monday(8, 20))
            .submit(request)
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::TimeSlotMissing));
    }

    #[actix_web::test]
    async fn identity_failure_persists_nothing() {
        let fx = Fixture::new().await;
        let stranger = Fixture {
            encoder: Arc::new(ScriptedEncoder::returning(vec![Descriptor(vec![5.0, 5.0])])),
            ..fx
        };
        let err = stranger
            .evaluator(monday(8, 20))
            .submit(stranger.request(Direction::Open, CAMPUS))
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::IdentityMismatch));
        assert_eq!(stranger.store.history_len(), 0);
    }

    #[actix_web::test]
    async fn repeated_checks_are_all_kept() {
        let fx = Fixture::new().await;
        let evaluator = fx.evaluator(monday(11, 40));
        evaluator
            .submit(fx.request(Direction::Close, CAMPUS))
            .await
            .unwrap();
        evaluator
            .submit(fx.request(Direction::Close, CAMPUS))
            .await
            .unwrap();
        assert_eq!(fx.store.history_len(), 2);
    }

    #[actix_web::test]
    async fn proof_is_archived_on_acceptance() {
        let fx = Fixture::new().await;
        let dir = std::env::temp_dir().join(format!("proofs-{}", uuid::Uuid::new_v4()));
        let mut evaluator = fx.evaluator(monday(8, 10));
        evaluator.proof_dir = Some(dir.clone());

        let record = evaluator
            .submit(fx.request(Direction::Open, CAMPUS))
            .await
            .unwrap();
        let file_name = record.image.expect("proof file name");
        assert_eq!(std::fs::read(dir.join(file_name)).unwrap(), b"jpeg");
        std::fs::remove_dir_all(dir).ok();
    }

    #[actix_web::test]
    async fn non_attendee_cannot_check_in() {
        let fx = Fixture::new().await;
        fx.store
            .add_membership(TEACHER, fx.rule_id, MembershipKind::NonAttendee, monday(0, 0))
            .await
            .unwrap();
        let err = fx
            .evaluator(monday(8, 20))
            .submit(fx.request(Direction::Open, CAMPUS))
            .await
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::NoAttendanceDay));
    }
}
