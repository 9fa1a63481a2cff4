use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::attendance_event::{AttendanceEvent, EventType};

/// User-correctable admission failures. Reported synchronously to the
/// caller and never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("already checked in today")]
    AlreadyCheckedIn,
}

/// Outcome of a successful admission: the session the event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub session_id: String,
}

/// A not-yet-persisted event under admission.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
}

/// Decide whether `candidate` may enter the ledger and which session it
/// joins.
///
/// `history` is the user's existing events, expected ordered by timestamp
/// ascending; ordering is re-derived from the timestamps here rather than
/// trusted, since storage does not enforce per-user monotonicity.
///
/// Policy, deliberately asymmetric:
/// - a second IN is rejected only while an IN from the *same calendar day*
///   is still open. An open session left over from a previous day does not
///   block the next morning's IN; otherwise one missed OUT scan would lock
///   the user out indefinitely.
/// - an OUT closes the most recent open IN from *any* day. An OUT with no
///   open IN at all is still admitted under a fresh session id; the ledger
///   records what happened at the checkpoint, and the stray OUT simply
///   never contributes working time.
pub fn admit_event(
    history: &[AttendanceEvent],
    candidate: &Candidate,
) -> Result<Admission, PolicyError> {
    match candidate.event_type {
        EventType::In => {
            let today = candidate.timestamp.date_naive();
            let todays = |e: &&AttendanceEvent| e.timestamp.date_naive() == today;

            if let Some(last_in) = latest_in(history.iter().filter(todays)) {
                let closed = history
                    .iter()
                    .filter(todays)
                    .any(|e| e.event_type == EventType::Out && e.timestamp >= last_in.timestamp);
                if !closed {
                    return Err(PolicyError::AlreadyCheckedIn);
                }
            }

            Ok(Admission {
                session_id: Uuid::new_v4().to_string(),
            })
        }
        EventType::Out => {
            let open = latest_in(history.iter()).filter(|last_in| {
                !history
                    .iter()
                    .any(|e| e.event_type == EventType::Out && e.timestamp >= last_in.timestamp)
            });

            let session_id = match open {
                Some(last_in) => last_in.session_id.clone(),
                None => Uuid::new_v4().to_string(),
            };
            Ok(Admission { session_id })
        }
    }
}

fn latest_in<'a>(
    events: impl Iterator<Item = &'a AttendanceEvent>,
) -> Option<&'a AttendanceEvent> {
    events
        .filter(|e| e.event_type == EventType::In)
        .max_by_key(|e| e.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance_event::Method;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, min, 0).unwrap()
    }

    fn event(
        id: u64,
        event_type: EventType,
        session_id: &str,
        timestamp: DateTime<Utc>,
    ) -> AttendanceEvent {
        AttendanceEvent {
            id,
            user_id: 7,
            event_type,
            method: Method::Qr,
            token: "tok".into(),
            session_id: session_id.into(),
            timestamp,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn first_in_of_day_gets_fresh_session() {
        let candidate = Candidate {
            event_type: EventType::In,
            timestamp: ts(5, 9, 0),
        };
        let admission = admit_event(&[], &candidate).unwrap();
        assert!(!admission.session_id.is_empty());
    }

    #[test]
    fn second_in_same_day_rejected_while_open() {
        let history = vec![event(1, EventType::In, "s1", ts(5, 9, 0))];
        let candidate = Candidate {
            event_type: EventType::In,
            timestamp: ts(5, 9, 5),
        };
        assert_eq!(
            admit_event(&history, &candidate),
            Err(PolicyError::AlreadyCheckedIn)
        );
    }

    #[test]
    fn in_allowed_again_after_out() {
        let history = vec![
            event(1, EventType::In, "s1", ts(5, 9, 0)),
            event(2, EventType::Out, "s1", ts(5, 12, 0)),
        ];
        let candidate = Candidate {
            event_type: EventType::In,
            timestamp: ts(5, 13, 0),
        };
        let admission = admit_event(&history, &candidate).unwrap();
        assert_ne!(admission.session_id, "s1");
    }

    #[test]
    fn stale_open_session_from_yesterday_does_not_block_in() {
        // Missed OUT scan the day before; today's IN must still go through.
        let history = vec![event(1, EventType::In, "s1", ts(4, 9, 0))];
        let candidate = Candidate {
            event_type: EventType::In,
            timestamp: ts(5, 9, 0),
        };
        assert!(admit_event(&history, &candidate).is_ok());
    }

    #[test]
    fn out_reuses_open_in_session_id() {
        let history = vec![event(1, EventType::In, "s1", ts(5, 9, 0))];
        let candidate = Candidate {
            event_type: EventType::Out,
            timestamp: ts(5, 17, 0),
        };
        let admission = admit_event(&history, &candidate).unwrap();
        assert_eq!(admission.session_id, "s1");
    }

    #[test]
    fn out_pairs_across_midnight() {
        // Night shift: IN yesterday evening, OUT this morning.
        let history = vec![event(1, EventType::In, "night", ts(4, 22, 0))];
        let candidate = Candidate {
            event_type: EventType::Out,
            timestamp: ts(5, 6, 0),
        };
        let admission = admit_event(&history, &candidate).unwrap();
        assert_eq!(admission.session_id, "night");
    }

    #[test]
    fn orphan_out_admitted_with_fresh_session() {
        let candidate = Candidate {
            event_type: EventType::Out,
            timestamp: ts(5, 9, 0),
        };
        let admission = admit_event(&[], &candidate).unwrap();
        assert!(!admission.session_id.is_empty());
    }

    #[test]
    fn out_after_closed_session_gets_fresh_session() {
        let history = vec![
            event(1, EventType::In, "s1", ts(5, 9, 0)),
            event(2, EventType::Out, "s1", ts(5, 12, 0)),
        ];
        let candidate = Candidate {
            event_type: EventType::Out,
            timestamp: ts(5, 17, 0),
        };
        let admission = admit_event(&history, &candidate).unwrap();
        assert_ne!(admission.session_id, "s1");
    }

    #[test]
    fn out_of_order_history_is_keyed_on_timestamps() {
        // Rows arrived out of order; decisions must follow timestamps,
        // not insertion order.
        let history = vec![
            event(2, EventType::Out, "s1", ts(5, 12, 0)),
            event(1, EventType::In, "s1", ts(5, 9, 0)),
        ];
        let candidate = Candidate {
            event_type: EventType::In,
            timestamp: ts(5, 13, 0),
        };
        assert!(admit_event(&history, &candidate).is_ok());
    }
}
