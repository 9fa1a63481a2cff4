use crate::attendance::hours::{self, HoursSummary};
use crate::auth::auth::AuthUser;
use crate::model::attendance_event::AttendanceEvent;
use crate::model::session::{Session, build_sessions};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct SessionFilter {
    /// Another user's sessions; admin only
    pub user_id: Option<u64>,
    #[param(example = "2026-01-01T00:00:00Z", value_type = String)]
    pub since: Option<DateTime<Utc>>,
    #[param(example = "2026-02-01T00:00:00Z", value_type = String)]
    pub until: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
    pub summary: HoursSummary,
}

#[derive(Deserialize, IntoParams)]
pub struct SummaryFilter {
    #[param(example = "2026-01-01T00:00:00Z", value_type = String)]
    pub since: Option<DateTime<Utc>>,
    #[param(example = "2026-02-01T00:00:00Z", value_type = String)]
    pub until: Option<DateTime<Utc>>,
}

/// One row per user; shaped for an external tabular/spreadsheet renderer.
#[derive(Serialize, ToSchema)]
pub struct UserSummaryRow {
    pub user_id: u64,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[serde(flatten)]
    pub summary: HoursSummary,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub data: Vec<UserSummaryRow>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub since: DateTime<Utc>,
    #[schema(example = "2026-02-01T00:00:00Z", format = "date-time", value_type = String)]
    pub until: DateTime<Utc>,
}

fn range(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        since.unwrap_or(DateTime::UNIX_EPOCH),
        until.unwrap_or_else(|| Utc::now() + chrono::Duration::days(1)),
    )
}

async fn fetch_events(
    pool: &MySqlPool,
    user_id: u64,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<AttendanceEvent>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceEvent>(
        r#"
        SELECT id, user_id, event_type, method, token, session_id,
               timestamp, latitude, longitude
        FROM attendance_events
        WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
        ORDER BY timestamp ASC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Derived sessions with an hours rollup
#[utoipa::path(
    get,
    path = "/api/v1/reports/sessions",
    params(SessionFilter),
    responses(
        (status = 200, description = "Sessions and hours summary", body = SessionsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Querying another user requires admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sessions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SessionFilter>,
) -> actix_web::Result<impl Responder> {
    let subject = match query.user_id {
        Some(other) if other != auth.user_id => {
            auth.require_admin()?;
            other
        }
        _ => auth.user_id,
    };

    let (since, until) = range(query.since, query.until);

    let events = fetch_events(pool.get_ref(), subject, since, until)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = subject, "Failed to fetch events for sessions");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let sessions = build_sessions(&events);
    let summary = hours::aggregate(&sessions);

    Ok(HttpResponse::Ok().json(SessionsResponse { sessions, summary }))
}

/// Per-user working-hours rollup over a period (admin)
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    params(SummaryFilter),
    responses(
        (status = 200, description = "Per-user aggregate rows", body = SummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (since, until) = range(query.since, query.until);

    let events = sqlx::query_as::<_, AttendanceEvent>(
        r#"
        SELECT id, user_id, event_type, method, token, session_id,
               timestamp, latitude, longitude
        FROM attendance_events
        WHERE timestamp >= ? AND timestamp < ?
        ORDER BY user_id ASC, timestamp ASC
        "#,
    )
    .bind(since)
    .bind(until)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch events for summary");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut per_user: BTreeMap<u64, Vec<AttendanceEvent>> = BTreeMap::new();
    for event in events {
        per_user.entry(event.user_id).or_default().push(event);
    }

    let names = sqlx::query_as::<_, (u64, String, String)>(
        "SELECT id, full_name, email FROM users",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch users for summary");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    let names: BTreeMap<u64, (String, String)> = names
        .into_iter()
        .map(|(id, name, email)| (id, (name, email)))
        .collect();

    let data = per_user
        .into_iter()
        .map(|(user_id, events)| {
            let sessions = build_sessions(&events);
            let (full_name, email) = names.get(&user_id).cloned().unwrap_or_default();
            UserSummaryRow {
                user_id,
                full_name,
                email,
                summary: hours::aggregate(&sessions),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(SummaryResponse { data, since, until }))
}
