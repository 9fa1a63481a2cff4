use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::model::attendance_event::{EventType, Method};

/// Fire-and-forget "attendance recorded" notification.
///
/// Called only after the event row is durably written. Delivery runs on a
/// detached task; any failure is logged and swallowed, never surfaced to
/// the recording caller.
pub fn attendance_recorded(
    pool: MySqlPool,
    user_id: u64,
    event_type: EventType,
    method: Method,
    timestamp: DateTime<Utc>,
) {
    let message = match event_type {
        EventType::In => format!(
            "Checked in via {} at {}",
            method.as_str(),
            timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        EventType::Out => format!(
            "Checked out via {} at {}",
            method.as_str(),
            timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    };

    actix_web::rt::spawn(async move {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, message)
            VALUES (?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&message)
        .execute(&pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, user_id, "Notification delivery failed (ignored)");
        }
    });
}
