use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::{AttendanceStore, StoreError, StoreResult, merge_comment};
use crate::biometric::Descriptor;
use crate::model::{
    check_in::{CheckInRecord, NewCheckIn},
    membership::{Membership, MembershipKind, latest_effective},
    place::{NewPlace, Place},
    rule::{AttendanceEvent, NewEvent, NewRule, Rule},
    schedule::{DaySchedule, NewDaySchedule},
    summary::DailySummary,
    time_slot::TimeSlot,
};

#[derive(Default)]
struct Inner {
    next_id: u64,
    teachers: Vec<u64>,
    places: Vec<Place>,
    schedules: Vec<DaySchedule>,
    rules: Vec<Rule>,
    memberships: Vec<Membership>,
    events: Vec<AttendanceEvent>,
    descriptors: Vec<(u64, Descriptor)>,
    history: Vec<CheckInRecord>,
    summaries: BTreeMap<(u64, NaiveDate), DailySummary>,
    /// Summary reads for this teacher fail with a backend error.
    unavailable_for: Option<u64>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store used by unit tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }

    pub fn add_teacher(&self, teacher_id: u64) {
        let mut inner = self.lock();
        if !inner.teachers.contains(&teacher_id) {
            inner.teachers.push(teacher_id);
        }
    }

    pub fn enroll(&self, teacher_id: u64, descriptor: Descriptor) {
        self.lock().descriptors.push((teacher_id, descriptor));
    }

    /// Inserts a record as-is, bypassing evaluation.
    pub fn push_check_in(&self, record: NewCheckIn) -> CheckInRecord {
        let mut inner = self.lock();
        let id = inner.next_id();
        let record = record.with_id(id);
        inner.history.push(record.clone());
        record
    }

    pub fn summary(&self, teacher_id: u64, date: NaiveDate) -> Option<DailySummary> {
        self.lock().summaries.get(&(teacher_id, date)).cloned()
    }

    pub fn summary_count(&self) -> usize {
        self.lock().summaries.len()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn fail_summaries_for(&self, teacher_id: Option<u64>) {
        self.lock().unavailable_for = teacher_id;
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn teacher_ids(&self) -> StoreResult<Vec<u64>> {
        let mut ids = self.lock().teachers.clone();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn latest_membership(
        &self,
        teacher_id: u64,
        kind: MembershipKind,
        date: NaiveDate,
    ) -> StoreResult<Option<Membership>> {
        let inner = self.lock();
        let candidates = inner
            .memberships
            .iter()
            .filter(|m| m.teacher_id == teacher_id && m.kind == kind);
        Ok(latest_effective(candidates, date).cloned())
    }

    async fn first_membership(&self, teacher_id: u64) -> StoreResult<Option<Membership>> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.teacher_id == teacher_id && m.kind == MembershipKind::Attendee)
            .min_by_key(|m| (m.joined_on, m.id))
            .cloned())
    }

    async fn add_membership(
        &self,
        teacher_id: u64,
        rule_id: u64,
        kind: MembershipKind,
        joined_on: NaiveDateTime,
    ) -> StoreResult<Membership> {
        let mut inner = self.lock();
        if !inner.rules.iter().any(|r| r.id == rule_id) {
            return Err(StoreError::Conflict(format!("rule {rule_id} does not exist")));
        }
        let membership = Membership {
            id: inner.next_id(),
            teacher_id,
            rule_id,
            kind,
            joined_on,
        };
        inner.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn create_place(&self, place: NewPlace) -> StoreResult<Place> {
        let mut inner = self.lock();
        let place = Place {
            id: inner.next_id(),
            name: place.name,
            address: place.address,
            latitude: place.latitude,
            longitude: place.longitude,
            radius: place.radius,
        };
        inner.places.push(place.clone());
        Ok(place)
    }

    async fn place(&self, place_id: u64) -> StoreResult<Place> {
        self.lock()
            .places
            .iter()
            .find(|p| p.id == place_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("place {place_id}")))
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        Ok(self.lock().places.clone())
    }

    async fn create_day_schedule(&self, schedule: NewDaySchedule) -> StoreResult<DaySchedule> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let slots = schedule
            .slots
            .into_iter()
            .map(|times| TimeSlot {
                id: inner.next_id(),
                times,
            })
            .collect();
        let schedule = DaySchedule {
            id,
            name: schedule.name,
            description: schedule.description,
            slots,
        };
        inner.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn day_schedule(&self, schedule_id: u64) -> StoreResult<DaySchedule> {
        self.lock()
            .schedules
            .iter()
            .find(|s| s.id == schedule_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("attendance time {schedule_id}")))
    }

    async fn list_day_schedules(&self) -> StoreResult<Vec<DaySchedule>> {
        Ok(self.lock().schedules.clone())
    }

    async fn create_rule(&self, rule: NewRule, joined_on: NaiveDateTime) -> StoreResult<Rule> {
        let mut inner = self.lock();
        let rule_id = inner.next_id();

        let members = rule
            .attendees
            .iter()
            .map(|id| (*id, MembershipKind::Attendee))
            .chain(
                rule.nonattendees
                    .iter()
                    .map(|id| (*id, MembershipKind::NonAttendee)),
            )
            .collect::<Vec<_>>();
        for (teacher_id, kind) in members {
            let membership = Membership {
                id: inner.next_id(),
                teacher_id,
                rule_id,
                kind,
                joined_on,
            };
            inner.memberships.push(membership);
        }

        for event in rule.events {
            let event = AttendanceEvent {
                id: inner.next_id(),
                rule_id,
                start_date: event.start_date,
                end_date: event.end_date,
                is_attendance_day: event.is_attendance_day,
                description: event.description,
            };
            inner.events.push(event);
        }

        let created = Rule {
            id: rule_id,
            name: rule.name,
            place_id: rule.place_id,
            week: rule.week,
            must_attendance_days: rule.must_attendance_days,
            never_attendance_days: rule.never_attendance_days,
        };
        inner.rules.push(created.clone());
        Ok(created)
    }

    async fn rule(&self, rule_id: u64) -> StoreResult<Rule> {
        self.lock()
            .rules
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("rule {rule_id}")))
    }

    async fn add_event(&self, rule_id: u64, event: NewEvent) -> StoreResult<AttendanceEvent> {
        let mut inner = self.lock();
        if !inner.rules.iter().any(|r| r.id == rule_id) {
            return Err(StoreError::Conflict(format!("rule {rule_id} does not exist")));
        }
        let event = AttendanceEvent {
            id: inner.next_id(),
            rule_id,
            start_date: event.start_date,
            end_date: event.end_date,
            is_attendance_day: event.is_attendance_day,
            description: event.description,
        };
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn events_covering(
        &self,
        rule_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<AttendanceEvent>> {
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| e.rule_id == rule_id && e.covers(date))
            .cloned()
            .collect())
    }

    async fn rule_events(&self, rule_id: u64) -> StoreResult<Vec<AttendanceEvent>> {
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| e.rule_id == rule_id)
            .cloned()
            .collect())
    }

    async fn face_descriptors(&self, teacher_id: u64) -> StoreResult<Vec<Descriptor>> {
        Ok(self
            .lock()
            .descriptors
            .iter()
            .filter(|(owner, _)| *owner == teacher_id)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn all_face_descriptors(&self) -> StoreResult<Vec<(u64, Descriptor)>> {
        Ok(self.lock().descriptors.clone())
    }

    async fn insert_check_in(&self, record: NewCheckIn) -> StoreResult<CheckInRecord> {
        Ok(self.push_check_in(record))
    }

    async fn append_comment(
        &self,
        record_id: u64,
        teacher_id: u64,
        comment: &str,
    ) -> StoreResult<CheckInRecord> {
        let mut inner = self.lock();
        let record = inner
            .history
            .iter_mut()
            .find(|r| r.id == record_id && r.teacher_id == teacher_id)
            .ok_or_else(|| StoreError::NotFound(format!("check-in {record_id}")))?;
        record.comment = Some(merge_comment(record.comment.as_deref(), comment));
        Ok(record.clone())
    }

    async fn check_ins_on(
        &self,
        membership_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|r| r.membership_id == membership_id && r.identified_on.date() == date)
            .cloned()
            .collect())
    }

    async fn check_ins_between(
        &self,
        teacher_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|r| {
                let day = r.identified_on.date();
                r.teacher_id == teacher_id && from <= day && day <= to
            })
            .cloned()
            .collect())
    }

    async fn summary_exists(&self, teacher_id: u64, date: NaiveDate) -> StoreResult<bool> {
        let inner = self.lock();
        if inner.unavailable_for == Some(teacher_id) {
            return Err(StoreError::Backend("connection reset".into()));
        }
        Ok(inner.summaries.contains_key(&(teacher_id, date)))
    }

    async fn insert_summary(&self, summary: DailySummary) -> StoreResult<bool> {
        let mut inner = self.lock();
        let key = (summary.teacher_id, summary.date);
        if inner.summaries.contains_key(&key) {
            return Ok(false);
        }
        inner.summaries.insert(key, summary);
        Ok(true)
    }

    async fn summaries_between(
        &self,
        teacher_id: Option<u64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DailySummary>> {
        Ok(self
            .lock()
            .summaries
            .values()
            .filter(|s| teacher_id.is_none_or(|id| s.teacher_id == id))
            .filter(|s| from <= s.date && s.date <= to)
            .cloned()
            .collect())
    }
}
