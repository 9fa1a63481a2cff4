use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::model::attendance_event::{AttendanceEvent, EventType};

/// A derived pairing of one IN event with its matching OUT.
///
/// Sessions are never stored; they are rebuilt from the event ledger on
/// demand. An OUT that was admitted without a prior IN yields a session
/// with `clock_in = None`, which never contributes a duration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    #[schema(example = "7f1c9a4e-1d2b-4b6e-9c1f-2a3b4c5d6e7f", value_type = String)]
    pub session_id: String,
    pub clock_in: Option<AttendanceEvent>,
    pub clock_out: Option<AttendanceEvent>,
}

impl Session {
    pub fn is_closed(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_some()
    }

    /// Elapsed time between IN and OUT; `None` while the session is open
    /// or when the IN side is missing.
    pub fn duration(&self) -> Option<Duration> {
        match (&self.clock_in, &self.clock_out) {
            (Some(i), Some(o)) => Some(o.timestamp - i.timestamp),
            _ => None,
        }
    }
}

/// Rebuild sessions from a user's event slice by grouping on `session_id`.
///
/// Events sharing a `session_id` collapse into one session; the earliest IN
/// and the latest OUT win if the ledger ever holds duplicates for a group.
/// Output is ordered by the session's first known timestamp.
pub fn build_sessions(events: &[AttendanceEvent]) -> Vec<Session> {
    let mut by_id: HashMap<&str, Session> = HashMap::new();

    for event in events {
        let entry = by_id
            .entry(event.session_id.as_str())
            .or_insert_with(|| Session {
                session_id: event.session_id.clone(),
                clock_in: None,
                clock_out: None,
            });

        match event.event_type {
            EventType::In => {
                let replace = entry
                    .clock_in
                    .as_ref()
                    .map(|cur| event.timestamp < cur.timestamp)
                    .unwrap_or(true);
                if replace {
                    entry.clock_in = Some(event.clone());
                }
            }
            EventType::Out => {
                let replace = entry
                    .clock_out
                    .as_ref()
                    .map(|cur| event.timestamp > cur.timestamp)
                    .unwrap_or(true);
                if replace {
                    entry.clock_out = Some(event.clone());
                }
            }
        }
    }

    let mut sessions: Vec<Session> = by_id.into_values().collect();
    sessions.sort_by_key(|s| {
        s.clock_in
            .as_ref()
            .or(s.clock_out.as_ref())
            .map(|e| e.timestamp)
    });
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance_event::Method;
    use chrono::{TimeZone, Utc};

    fn event(id: u64, event_type: EventType, session_id: &str, hour: u32) -> AttendanceEvent {
        AttendanceEvent {
            id,
            user_id: 1,
            event_type,
            method: Method::Qr,
            token: "tok".into(),
            session_id: session_id.into(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0).unwrap(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn pairs_in_and_out_by_session_id() {
        let events = vec![
            event(1, EventType::In, "a", 9),
            event(2, EventType::Out, "a", 17),
        ];
        let sessions = build_sessions(&events);
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_closed());
        assert_eq!(sessions[0].duration().unwrap().num_hours(), 8);
    }

    #[test]
    fn orphan_out_forms_session_without_in() {
        let events = vec![event(1, EventType::Out, "b", 9)];
        let sessions = build_sessions(&events);
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].clock_in.is_none());
        assert!(sessions[0].duration().is_none());
    }

    #[test]
    fn open_session_has_no_duration() {
        let events = vec![event(1, EventType::In, "c", 9)];
        let sessions = build_sessions(&events);
        assert!(!sessions[0].is_closed());
        assert!(sessions[0].duration().is_none());
    }

    #[test]
    fn sessions_ordered_by_first_timestamp() {
        let events = vec![
            event(3, EventType::In, "later", 13),
            event(1, EventType::In, "earlier", 8),
            event(2, EventType::Out, "earlier", 12),
        ];
        let sessions = build_sessions(&events);
        assert_eq!(sessions[0].session_id, "earlier");
        assert_eq!(sessions[1].session_id, "later");
    }
}
