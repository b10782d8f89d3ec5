use crate::api::attendance::{CommentReq, DayStatus, TodayResponse};
use crate::api::rule::RuleDetail;
use crate::model::{
    check_in::CheckInRecord,
    membership::{Membership, MembershipKind, NewMembership},
    place::{NewPlace, Place},
    rule::{AttendanceEvent, NewEvent, NewRule, Rule},
    schedule::{DaySchedule, NewDaySchedule},
    summary::DailySummary,
    time_slot::{SlotTimes, TimeSlot},
};
use crate::regulation::identity::IdentityMatch;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Attendance API",
        version = "1.0.0",
        description = r#"
## Staff Attendance Regulation

Decides when a teacher must check in, validates each check-in attempt, and
summarizes every elapsed day.

### Key Features
- **Rules**
  - Weekly template of attendance times, override days, holiday and make-up events
- **Check-in**
  - Server-clock time windows, face identity proof, geofence flagging
- **Reports**
  - Write-once daily summaries: required checks, checks, late, early leave, out of area

### Rejection codes
`NO_ATTENDANCE_DAY`, `TIMESLOT_MISSING`, `OUT_OF_ATTENDANCE_TIME`,
`NO_ENROLLMENT_DATA`, `IDENTITY_MISMATCH`, `NO_FACE_DETECTED`.

### Security
Every endpoint requires a **JWT Bearer** token; configuration endpoints need the Admin role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::identify,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::append_comment,

        crate::api::summary::list_summaries,
        crate::api::summary::run_summaries,

        crate::api::place::create_place,
        crate::api::place::list_places,

        crate::api::attendance_time::create_attendance_time,
        crate::api::attendance_time::list_attendance_times,

        crate::api::rule::create_rule,
        crate::api::rule::get_rule,
        crate::api::rule::add_membership,
        crate::api::rule::add_event,

        crate::api::enrollment::refresh_descriptors
    ),
    components(
        schemas(
            CheckInRecord,
            CommentReq,
            DayStatus,
            TodayResponse,
            IdentityMatch,
            DailySummary,
            Place,
            NewPlace,
            SlotTimes,
            TimeSlot,
            DaySchedule,
            NewDaySchedule,
            Rule,
            NewRule,
            RuleDetail,
            AttendanceEvent,
            NewEvent,
            Membership,
            MembershipKind,
            NewMembership
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Check-in and personal history APIs"),
        (name = "Reports", description = "Daily summary APIs"),
        (name = "Configuration", description = "Places, attendance times, rules and memberships"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
