use serde::Serialize;
use utoipa::ToSchema;

use crate::model::session::Session;

/// Aggregate working time over a set of derived sessions.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HoursSummary {
    /// Sum of closed-session durations, fractional hours.
    #[schema(example = 40.5)]
    pub total_hours: f64,
    /// `total_hours / closed_sessions`; exactly 0.0 when nothing is closed.
    #[schema(example = 8.1)]
    pub average_hours: f64,
    #[schema(example = 5)]
    pub closed_sessions: u64,
    /// Sessions still missing an OUT (or orphan OUTs missing their IN).
    /// Tallied for display, excluded from the duration math.
    #[schema(example = 1)]
    pub open_sessions: u64,
}

/// Pure rollup: only sessions with both ends populated contribute duration.
pub fn aggregate(sessions: &[Session]) -> HoursSummary {
    let mut total_secs: i64 = 0;
    let mut closed: u64 = 0;
    let mut open: u64 = 0;

    for session in sessions {
        match session.duration() {
            Some(d) => {
                total_secs += d.num_seconds();
                closed += 1;
            }
            None => open += 1,
        }
    }

    let total_hours = total_secs as f64 / 3600.0;
    let average_hours = if closed == 0 {
        0.0
    } else {
        total_hours / closed as f64
    };

    HoursSummary {
        total_hours,
        average_hours,
        closed_sessions: closed,
        open_sessions: open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance_event::{AttendanceEvent, EventType, Method};
    use chrono::{TimeZone, Utc};

    fn event(event_type: EventType, session_id: &str, hour: u32) -> AttendanceEvent {
        AttendanceEvent {
            id: 0,
            user_id: 1,
            event_type,
            method: Method::Nfc,
            token: "tag-001".into(),
            session_id: session_id.into(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0).unwrap(),
            latitude: None,
            longitude: None,
        }
    }

    fn closed_session(id: &str, in_hour: u32, out_hour: u32) -> Session {
        Session {
            session_id: id.into(),
            clock_in: Some(event(EventType::In, id, in_hour)),
            clock_out: Some(event(EventType::Out, id, out_hour)),
        }
    }

    #[test]
    fn nine_to_five_is_eight_hours() {
        let sessions = vec![closed_session("a", 9, 17)];
        let summary = aggregate(&sessions);
        assert_eq!(summary.total_hours, 8.0);
        assert_eq!(summary.average_hours, 8.0);
        assert_eq!(summary.closed_sessions, 1);
        assert_eq!(summary.open_sessions, 0);
    }

    #[test]
    fn open_sessions_counted_but_excluded_from_math() {
        let sessions = vec![
            closed_session("a", 9, 13),
            Session {
                session_id: "b".into(),
                clock_in: Some(event(EventType::In, "b", 14)),
                clock_out: None,
            },
        ];
        let summary = aggregate(&sessions);
        assert_eq!(summary.total_hours, 4.0);
        assert_eq!(summary.closed_sessions, 1);
        assert_eq!(summary.open_sessions, 1);
    }

    #[test]
    fn orphan_out_excluded_from_math() {
        let sessions = vec![Session {
            session_id: "x".into(),
            clock_in: None,
            clock_out: Some(event(EventType::Out, "x", 9)),
        }];
        let summary = aggregate(&sessions);
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.open_sessions, 1);
    }

    #[test]
    fn no_closed_sessions_average_is_zero() {
        let summary = aggregate(&[]);
        assert_eq!(summary.average_hours, 0.0);
        assert_eq!(summary.total_hours, 0.0);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let sessions = vec![closed_session("a", 9, 17), closed_session("b", 10, 12)];
        assert_eq!(aggregate(&sessions), aggregate(&sessions));
    }
}
