use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::StreamExt;
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceStore, StoreError, StoreResult, merge_comment};
use crate::biometric::Descriptor;
use crate::model::{
    check_in::{CheckInRecord, NewCheckIn},
    membership::{Membership, MembershipKind},
    place::{NewPlace, Place},
    rule::{AttendanceEvent, NewEvent, NewRule, Rule},
    schedule::{DaySchedule, NewDaySchedule, WeekTemplate},
    summary::DailySummary,
    time_slot::{SlotTimes, TimeSlot},
};

/// MySQL implementation of `AttendanceStore`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// =========================
// Row types
// =========================

#[derive(FromRow)]
struct MembershipRow {
    id: u64,
    teacher_id: u64,
    rule_id: u64,
    kind: String,
    joined_on: NaiveDateTime,
}

impl MembershipRow {
    fn into_domain(self) -> StoreResult<Membership> {
        let kind = MembershipKind::from_db(&self.kind).ok_or_else(|| {
            StoreError::Backend(format!("membership {} has unknown kind {}", self.id, self.kind))
        })?;
        Ok(Membership {
            id: self.id,
            teacher_id: self.teacher_id,
            rule_id: self.rule_id,
            kind,
            joined_on: self.joined_on,
        })
    }
}

#[derive(FromRow)]
struct SlotRow {
    id: u64,
    start_open_time: NaiveTime,
    open_time: NaiveTime,
    finish_open_time: NaiveTime,
    start_close_time: NaiveTime,
    close_time: NaiveTime,
    finish_close_time: NaiveTime,
}

impl SlotRow {
    fn into_domain(self) -> TimeSlot {
        TimeSlot {
            id: self.id,
            times: SlotTimes {
                start_open_time: self.start_open_time,
                open_time: self.open_time,
                finish_open_time: self.finish_open_time,
                start_close_time: self.start_close_time,
                close_time: self.close_time,
                finish_close_time: self.finish_close_time,
            },
        }
    }
}

#[derive(FromRow)]
struct ScheduleSlotRow {
    attendance_time_id: u64,
    id: u64,
    start_open_time: NaiveTime,
    open_time: NaiveTime,
    finish_open_time: NaiveTime,
    start_close_time: NaiveTime,
    close_time: NaiveTime,
    finish_close_time: NaiveTime,
}

impl ScheduleSlotRow {
    fn split(self) -> (u64, TimeSlot) {
        let slot = SlotRow {
            id: self.id,
            start_open_time: self.start_open_time,
            open_time: self.open_time,
            finish_open_time: self.finish_open_time,
            start_close_time: self.start_close_time,
            close_time: self.close_time,
            finish_close_time: self.finish_close_time,
        };
        (self.attendance_time_id, slot.into_domain())
    }
}

#[derive(FromRow)]
struct ScheduleRow {
    id: u64,
    name: String,
    description: Option<String>,
}

#[derive(FromRow)]
struct RuleRow {
    id: u64,
    name: String,
    attendance_place_id: Option<u64>,
    mon: Option<u64>,
    tue: Option<u64>,
    wed: Option<u64>,
    thu: Option<u64>,
    fri: Option<u64>,
    sat: Option<u64>,
    sun: Option<u64>,
}

#[derive(FromRow)]
struct OverrideDayRow {
    day: NaiveDate,
    is_attendance_day: bool,
}

const SLOT_COLUMNS: &str = "ts.id, ts.start_open_time, ts.open_time, ts.finish_open_time, \
     ts.start_close_time, ts.close_time, ts.finish_close_time";

const HISTORY_COLUMNS: &str = "id, membership_id, teacher_id, time_slot_id, is_open_attend, \
     identified_on, latitude, longitude, is_right_place, is_bad_attendance, image, comment";

const SUMMARY_COLUMNS: &str = "teacher_id, date, total_checks, checks, late_attendances, \
     early_leaves, outside_checks, holidays";

/// Half-open datetime range covering the calendar days `from..=to`.
fn day_bounds(from: NaiveDate, to: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = from.and_time(NaiveTime::MIN);
    let end = to
        .succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX);
    (start, end)
}

fn parse_descriptor(raw: &str) -> StoreResult<Descriptor> {
    serde_json::from_str(raw).map_err(|e| StoreError::Backend(format!("bad descriptor: {e}")))
}

impl MySqlStore {
    async fn slots_for(&self, schedule_id: u64) -> StoreResult<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            r#"
            SELECT {SLOT_COLUMNS}
            FROM time_slots ts
            JOIN attendance_time_slots ats ON ats.time_slot_id = ts.id
            WHERE ats.attendance_time_id = ?
            ORDER BY ats.position
            "#
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SlotRow::into_domain).collect())
    }

    async fn membership_by_id(&self, membership_id: u64) -> StoreResult<Membership> {
        sqlx::query_as::<_, MembershipRow>(
            "SELECT id, teacher_id, rule_id, kind, joined_on FROM attendance_memberships WHERE id = ?",
        )
        .bind(membership_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("membership {membership_id}")))?
        .into_domain()
    }

    async fn check_in_by_id(&self, record_id: u64) -> StoreResult<CheckInRecord> {
        sqlx::query_as::<_, CheckInRecord>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM attendance_history WHERE id = ?"
        ))
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("check-in {record_id}")))
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn teacher_ids(&self) -> StoreResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>("SELECT id FROM teachers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn latest_membership(
        &self,
        teacher_id: u64,
        kind: MembershipKind,
        date: NaiveDate,
    ) -> StoreResult<Option<Membership>> {
        let (_, end) = day_bounds(date, date);
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, teacher_id, rule_id, kind, joined_on
            FROM attendance_memberships
            WHERE teacher_id = ? AND kind = ? AND joined_on < ?
            ORDER BY joined_on DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(teacher_id)
        .bind(kind.as_str())
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MembershipRow::into_domain).transpose()
    }

    async fn first_membership(&self, teacher_id: u64) -> StoreResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, teacher_id, rule_id, kind, joined_on
            FROM attendance_memberships
            WHERE teacher_id = ? AND kind = ?
            ORDER BY joined_on ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(teacher_id)
        .bind(MembershipKind::Attendee.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MembershipRow::into_domain).transpose()
    }

    async fn add_membership(
        &self,
        teacher_id: u64,
        rule_id: u64,
        kind: MembershipKind,
        joined_on: NaiveDateTime,
    ) -> StoreResult<Membership> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_memberships (teacher_id, rule_id, kind, joined_on)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(teacher_id)
        .bind(rule_id)
        .bind(kind.as_str())
        .bind(joined_on)
        .execute(&self.pool)
        .await?;

        self.membership_by_id(result.last_insert_id()).await
    }

    async fn create_place(&self, place: NewPlace) -> StoreResult<Place> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_places (name, address, latitude, longitude, radius)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&place.name)
        .bind(&place.address)
        .bind(place.latitude)
        .bind(place.longitude)
        .bind(place.radius)
        .execute(&self.pool)
        .await?;

        Ok(Place {
            id: result.last_insert_id(),
            name: place.name,
            address: place.address,
            latitude: place.latitude,
            longitude: place.longitude,
            radius: place.radius,
        })
    }

    async fn place(&self, place_id: u64) -> StoreResult<Place> {
        sqlx::query_as::<_, Place>(
            "SELECT id, name, address, latitude, longitude, radius FROM attendance_places WHERE id = ?",
        )
        .bind(place_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("place {place_id}")))
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        let places = sqlx::query_as::<_, Place>(
            "SELECT id, name, address, latitude, longitude, radius FROM attendance_places ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(places)
    }

    async fn create_day_schedule(&self, schedule: NewDaySchedule) -> StoreResult<DaySchedule> {
        let mut tx = self.pool.begin().await?;

        let schedule_id = sqlx::query("INSERT INTO attendance_times (name, description) VALUES (?, ?)")
            .bind(&schedule.name)
            .bind(&schedule.description)
            .execute(&mut *tx)
            .await?
            .last_insert_id();

        let mut slots = Vec::with_capacity(schedule.slots.len());
        for (position, times) in schedule.slots.iter().enumerate() {
            let slot_id = sqlx::query(
                r#"
                INSERT INTO time_slots
                    (start_open_time, open_time, finish_open_time,
                     start_close_time, close_time, finish_close_time)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(times.start_open_time)
            .bind(times.open_time)
            .bind(times.finish_open_time)
            .bind(times.start_close_time)
            .bind(times.close_time)
            .bind(times.finish_close_time)
            .execute(&mut *tx)
            .await?
            .last_insert_id();

            sqlx::query(
                r#"
                INSERT INTO attendance_time_slots (attendance_time_id, time_slot_id, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(schedule_id)
            .bind(slot_id)
            .bind(position as u32)
            .execute(&mut *tx)
            .await?;

            slots.push(TimeSlot {
                id: slot_id,
                times: *times,
            });
        }

        tx.commit().await?;

        Ok(DaySchedule {
            id: schedule_id,
            name: schedule.name,
            description: schedule.description,
            slots,
        })
    }

    async fn day_schedule(&self, schedule_id: u64) -> StoreResult<DaySchedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, name, description FROM attendance_times WHERE id = ?",
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("attendance time {schedule_id}")))?;

        Ok(DaySchedule {
            id: row.id,
            name: row.name,
            description: row.description,
            slots: self.slots_for(schedule_id).await?,
        })
    }

    async fn list_day_schedules(&self) -> StoreResult<Vec<DaySchedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT id, name, description FROM attendance_times ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let slot_rows = sqlx::query_as::<_, ScheduleSlotRow>(&format!(
            r#"
            SELECT ats.attendance_time_id, {SLOT_COLUMNS}
            FROM time_slots ts
            JOIN attendance_time_slots ats ON ats.time_slot_id = ts.id
            ORDER BY ats.attendance_time_id, ats.position
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut slots_by_schedule: HashMap<u64, Vec<TimeSlot>> = HashMap::new();
        for row in slot_rows {
            let (schedule_id, slot) = row.split();
            slots_by_schedule.entry(schedule_id).or_default().push(slot);
        }

        Ok(rows
            .into_iter()
            .map(|row| DaySchedule {
                slots: slots_by_schedule.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                description: row.description,
            })
            .collect())
    }

    async fn create_rule(&self, rule: NewRule, joined_on: NaiveDateTime) -> StoreResult<Rule> {
        let mut tx = self.pool.begin().await?;
        let [mon, tue, wed, thu, fri, sat, sun] = rule.week.0;

        let rule_id = sqlx::query(
            r#"
            INSERT INTO attendance_rules
                (name, attendance_place_id, mon, tue, wed, thu, fri, sat, sun)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rule.name)
        .bind(rule.place_id)
        .bind(mon)
        .bind(tue)
        .bind(wed)
        .bind(thu)
        .bind(fri)
        .bind(sat)
        .bind(sun)
        .execute(&mut *tx)
        .await?
        .last_insert_id();

        let overrides = rule
            .must_attendance_days
            .iter()
            .map(|day| (*day, true))
            .chain(rule.never_attendance_days.iter().map(|day| (*day, false)));
        for (day, is_attendance_day) in overrides {
            sqlx::query(
                "INSERT IGNORE INTO rule_override_days (rule_id, day, is_attendance_day) VALUES (?, ?, ?)",
            )
            .bind(rule_id)
            .bind(day)
            .bind(is_attendance_day)
            .execute(&mut *tx)
            .await?;
        }

        let members = rule
            .attendees
            .iter()
            .map(|id| (*id, MembershipKind::Attendee))
            .chain(
                rule.nonattendees
                    .iter()
                    .map(|id| (*id, MembershipKind::NonAttendee)),
            );
        for (teacher_id, kind) in members {
            sqlx::query(
                r#"
                INSERT INTO attendance_memberships (teacher_id, rule_id, kind, joined_on)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(teacher_id)
            .bind(rule_id)
            .bind(kind.as_str())
            .bind(joined_on)
            .execute(&mut *tx)
            .await?;
        }

        for event in &rule.events {
            sqlx::query(
                r#"
                INSERT INTO attendance_events
                    (rule_id, start_date, end_date, is_attendance_day, description)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(rule_id)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.is_attendance_day)
            .bind(&event.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Rule {
            id: rule_id,
            name: rule.name,
            place_id: rule.place_id,
            week: rule.week,
            must_attendance_days: rule.must_attendance_days,
            never_attendance_days: rule.never_attendance_days,
        })
    }

    async fn rule(&self, rule_id: u64) -> StoreResult<Rule> {
        let row = sqlx::query_as::<_, RuleRow>(
            r#"
            SELECT id, name, attendance_place_id, mon, tue, wed, thu, fri, sat, sun
            FROM attendance_rules
            WHERE id = ?
            "#,
        )
        .bind(rule_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("rule {rule_id}")))?;

        let overrides = sqlx::query_as::<_, OverrideDayRow>(
            "SELECT day, is_attendance_day FROM rule_override_days WHERE rule_id = ? ORDER BY day",
        )
        .bind(rule_id)
        .fetch_all(&self.pool)
        .await?;

        let (must, never): (Vec<_>, Vec<_>) =
            overrides.into_iter().partition(|o| o.is_attendance_day);

        Ok(Rule {
            id: row.id,
            name: row.name,
            place_id: row.attendance_place_id,
            week: WeekTemplate([
                row.mon, row.tue, row.wed, row.thu, row.fri, row.sat, row.sun,
            ]),
            must_attendance_days: must.into_iter().map(|o| o.day).collect(),
            never_attendance_days: never.into_iter().map(|o| o.day).collect(),
        })
    }

    async fn add_event(&self, rule_id: u64, event: NewEvent) -> StoreResult<AttendanceEvent> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_events
                (rule_id, start_date, end_date, is_attendance_day, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule_id)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.is_attendance_day)
        .bind(&event.description)
        .execute(&self.pool)
        .await?;

        Ok(AttendanceEvent {
            id: result.last_insert_id(),
            rule_id,
            start_date: event.start_date,
            end_date: event.end_date,
            is_attendance_day: event.is_attendance_day,
            description: event.description,
        })
    }

    async fn events_covering(
        &self,
        rule_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<AttendanceEvent>> {
        let events = sqlx::query_as::<_, AttendanceEvent>(
            r#"
            SELECT id, rule_id, start_date, end_date, is_attendance_day, description
            FROM attendance_events
            WHERE rule_id = ? AND start_date <= ? AND end_date >= ?
            ORDER BY id
            "#,
        )
        .bind(rule_id)
        .bind(date)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn rule_events(&self, rule_id: u64) -> StoreResult<Vec<AttendanceEvent>> {
        let events = sqlx::query_as::<_, AttendanceEvent>(
            r#"
            SELECT id, rule_id, start_date, end_date, is_attendance_day, description
            FROM attendance_events
            WHERE rule_id = ?
            ORDER BY start_date, id
            "#,
        )
        .bind(rule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn face_descriptors(&self, teacher_id: u64) -> StoreResult<Vec<Descriptor>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT descriptor FROM face_descriptors WHERE teacher_id = ? ORDER BY id",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|raw| parse_descriptor(raw)).collect()
    }

    async fn all_face_descriptors(&self) -> StoreResult<Vec<(u64, Descriptor)>> {
        let mut stream = sqlx::query_as::<_, (u64, String)>(
            "SELECT teacher_id, descriptor FROM face_descriptors ORDER BY teacher_id, id",
        )
        .fetch(&self.pool);

        let mut descriptors = Vec::new();
        while let Some(row) = stream.next().await {
            let (teacher_id, raw) = row?;
            match parse_descriptor(&raw) {
                Ok(descriptor) => descriptors.push((teacher_id, descriptor)),
                // Unreadable rows are skipped
                Err(e) => tracing::warn!(teacher_id, "skipping unreadable face descriptor: {e}"),
            }
        }
        Ok(descriptors)
    }

    async fn insert_check_in(&self, record: NewCheckIn) -> StoreResult<CheckInRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_history
                (membership_id, teacher_id, time_slot_id, is_open_attend, identified_on,
                 latitude, longitude, is_right_place, is_bad_attendance, image, comment)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.membership_id)
        .bind(record.teacher_id)
        .bind(record.time_slot_id)
        .bind(record.is_open_attend)
        .bind(record.identified_on)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.is_right_place)
        .bind(record.is_bad_attendance)
        .bind(&record.image)
        .bind(&record.comment)
        .execute(&self.pool)
        .await?;

        Ok(record.with_id(result.last_insert_id()))
    }

    async fn append_comment(
        &self,
        record_id: u64,
        teacher_id: u64,
        comment: &str,
    ) -> StoreResult<CheckInRecord> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, (u64, Option<String>)>(
            "SELECT teacher_id, comment FROM attendance_history WHERE id = ? FOR UPDATE",
        )
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match existing {
            Some((owner, current)) if owner == teacher_id => current,
            _ => return Err(StoreError::NotFound(format!("check-in {record_id}"))),
        };

        sqlx::query("UPDATE attendance_history SET comment = ? WHERE id = ?")
            .bind(merge_comment(current.as_deref(), comment))
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.check_in_by_id(record_id).await
    }

    async fn check_ins_on(
        &self,
        membership_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>> {
        let (start, end) = day_bounds(date, date);
        let records = sqlx::query_as::<_, CheckInRecord>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM attendance_history
            WHERE membership_id = ? AND identified_on >= ? AND identified_on < ?
            ORDER BY identified_on, id
            "#
        ))
        .bind(membership_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn check_ins_between(
        &self,
        teacher_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckInRecord>> {
        let (start, end) = day_bounds(from, to);
        let records = sqlx::query_as::<_, CheckInRecord>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS}
            FROM attendance_history
            WHERE teacher_id = ? AND identified_on >= ? AND identified_on < ?
            ORDER BY identified_on, id
            "#
        ))
        .bind(teacher_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn summary_exists(&self, teacher_id: u64, date: NaiveDate) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM attendance_date_person WHERE teacher_id = ? AND date = ? LIMIT 1)",
        )
        .bind(teacher_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_summary(&self, summary: DailySummary) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO attendance_date_person
                (teacher_id, date, total_checks, checks, late_attendances,
                 early_leaves, outside_checks, holidays)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(summary.teacher_id)
        .bind(summary.date)
        .bind(summary.total_checks)
        .bind(summary.checks)
        .bind(summary.late_attendances)
        .bind(summary.early_leaves)
        .bind(summary.outside_checks)
        .bind(summary.holidays)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn summaries_between(
        &self,
        teacher_id: Option<u64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<DailySummary>> {
        let rows = match teacher_id {
            Some(teacher_id) => {
                sqlx::query_as::<_, DailySummary>(&format!(
                    r#"
                    SELECT {SUMMARY_COLUMNS}
                    FROM attendance_date_person
                    WHERE teacher_id = ? AND date BETWEEN ? AND ?
                    ORDER BY date
                    "#
                ))
                .bind(teacher_id)
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DailySummary>(&format!(
                    r#"
                    SELECT {SUMMARY_COLUMNS}
                    FROM attendance_date_person
                    WHERE date BETWEEN ? AND ?
                    ORDER BY date, teacher_id
                    "#
                ))
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}

#[cfg(test)]
mod mysql_store_tests {
    use super::*;

    #[test]
    fn day_bounds_cover_whole_days() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let (start, end) = day_bounds(from, to);
        assert_eq!(start, from.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn descriptor_text_parses() {
        assert_eq!(parse_descriptor("[0.5, -0.25]").unwrap(), Descriptor(vec![0.5, -0.25]));
        assert!(matches!(parse_descriptor("not json"), Err(StoreError::Backend(_))));
    }
}
