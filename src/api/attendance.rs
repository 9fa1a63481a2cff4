use crate::attendance::credential::{CredentialError, validate_credential};
use crate::attendance::reconciler::{self, Candidate, PolicyError};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance_event::{AttendanceEvent, EventType, Method};
use crate::utils::{notify, user_lock};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

/// How many recent rows the OUT-pairing scan considers. An open IN that
/// has already scrolled out of this window is treated as abandoned.
const ADMISSION_WINDOW: i64 = 50;

#[derive(Deserialize, ToSchema)]
pub struct RecordEventReq {
    #[schema(example = "QR")]
    pub method: Method,
    /// QR token string or NFC/RFID tag id. Ignored for MANUAL entries.
    pub token: Option<String>,
    #[schema(example = 52.52)]
    pub latitude: Option<f64>,
    #[schema(example = 13.405)]
    pub longitude: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordEventResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    #[schema(example = "7f1c9a4e-1d2b-4b6e-9c1f-2a3b4c5d6e7f")]
    pub session_id: String,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryFilter {
    /// Range start (inclusive)
    #[param(example = "2026-01-01T00:00:00Z", value_type = String)]
    pub since: Option<DateTime<Utc>>,
    /// Range end (exclusive)
    #[param(example = "2026-02-01T00:00:00Z", value_type = String)]
    pub until: Option<DateTime<Utc>>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub data: Vec<AttendanceEvent>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = RecordEventReq,
    responses(
        (status = 200, description = "Checked in successfully", body = RecordEventResponse),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Invalid or expired QR token"),
        (status = 403, description = "Badge not recognized / manual entry forbidden"),
        (status = 409, description = "Concurrent admission conflict, retry once"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RecordEventReq>,
) -> actix_web::Result<impl Responder> {
    record_event(auth, pool, config, payload, EventType::In).await
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = RecordEventReq,
    responses(
        (status = 200, description = "Checked out successfully", body = RecordEventResponse),
        (status = 401, description = "Invalid or expired QR token"),
        (status = 403, description = "Badge not recognized / manual entry forbidden"),
        (status = 409, description = "Concurrent admission conflict, retry once"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RecordEventReq>,
) -> actix_web::Result<impl Responder> {
    record_event(auth, pool, config, payload, EventType::Out).await
}

/// Shared admission path for IN and OUT.
///
/// Order matters: credential check first, then the per-user lock is held
/// across read-decide-write so concurrent admissions for one user
/// serialize, then the notification fires only after the row is durable.
async fn record_event(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<RecordEventReq>,
    event_type: EventType,
) -> actix_web::Result<HttpResponse> {
    let user_id = auth.user_id;
    let token = payload.token.clone().unwrap_or_default();

    let registered_tag =
        sqlx::query_scalar::<_, Option<String>>("SELECT rfid_tag FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id, "Failed to load badge registration");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
            .flatten();

    if let Err(e) = validate_credential(
        payload.method,
        &token,
        auth.role,
        registered_tag.as_deref(),
        &config.jwt_secret,
    ) {
        return Ok(match e {
            CredentialError::InvalidToken => HttpResponse::Unauthorized().json(
                serde_json::json!({ "message": "Invalid or expired token" }),
            ),
            CredentialError::UnknownBadge => HttpResponse::Forbidden()
                .json(serde_json::json!({ "message": "Badge not recognized" })),
            CredentialError::ManualNotAllowed => HttpResponse::Forbidden().json(
                serde_json::json!({ "message": "Manual entry requires admin role" }),
            ),
        });
    }

    let timestamp = Utc::now();

    // Serialize the read-decide-write cycle per user; held until the row
    // is written.
    let _guard = user_lock::acquire(user_id).await;

    let history = load_admission_history(pool.get_ref(), user_id, event_type, timestamp)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to load event history");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let candidate = Candidate {
        event_type,
        timestamp,
    };

    let admission = match reconciler::admit_event(&history, &candidate) {
        Ok(a) => a,
        Err(PolicyError::AlreadyCheckedIn) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Already checked in today"
            })));
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_events
            (user_id, event_type, method, token, session_id, timestamp, latitude, longitude)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(event_type)
    .bind(payload.method)
    .bind(&token)
    .bind(&admission.session_id)
    .bind(timestamp)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // Losing writer of a storage-level conflict; the caller retries
        // the whole cycle once.
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Ok(HttpResponse::Conflict().json(serde_json::json!({
                    "message": "Conflicting attendance event, please retry"
                })));
            }
        }

        tracing::error!(error = %e, user_id, "Failed to record attendance event");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    }

    // Event is durable; delivery failures are logged and swallowed.
    notify::attendance_recorded(
        pool.get_ref().clone(),
        user_id,
        event_type,
        payload.method,
        timestamp,
    );

    let message = match event_type {
        EventType::In => "Checked in successfully",
        EventType::Out => "Checked out successfully",
    };

    Ok(HttpResponse::Ok().json(RecordEventResponse {
        message: message.to_string(),
        session_id: admission.session_id,
    }))
}

/// History slice the reconciler decides against.
///
/// The IN guard only ever looks at the candidate's calendar day, so a
/// day-bounded query suffices. The OUT pairing scans backwards any
/// distance, bounded here by the admission window.
async fn load_admission_history(
    pool: &MySqlPool,
    user_id: u64,
    event_type: EventType,
    now: DateTime<Utc>,
) -> Result<Vec<AttendanceEvent>, sqlx::Error> {
    match event_type {
        EventType::In => {
            sqlx::query_as::<_, AttendanceEvent>(
                r#"
                SELECT id, user_id, event_type, method, token, session_id,
                       timestamp, latitude, longitude
                FROM attendance_events
                WHERE user_id = ? AND DATE(timestamp) = DATE(?)
                ORDER BY timestamp ASC
                "#,
            )
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
        }
        EventType::Out => {
            let mut recent = sqlx::query_as::<_, AttendanceEvent>(
                r#"
                SELECT id, user_id, event_type, method, token, session_id,
                       timestamp, latitude, longitude
                FROM attendance_events
                WHERE user_id = ?
                ORDER BY timestamp DESC
                LIMIT ?
                "#,
            )
            .bind(user_id)
            .bind(ADMISSION_WINDOW)
            .fetch_all(pool)
            .await?;
            recent.reverse();
            Ok(recent)
        }
    }
}

/// Own attendance history, newest page first
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Paginated event list", body = HistoryResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let since = query.since.unwrap_or(DateTime::UNIX_EPOCH);
    let until = query
        .until
        .unwrap_or_else(|| Utc::now() + chrono::Duration::days(1));

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM attendance_events
        WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
        "#,
    )
    .bind(auth.user_id)
    .bind(since)
    .bind(until)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance events");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let events = sqlx::query_as::<_, AttendanceEvent>(
        r#"
        SELECT id, user_id, event_type, method, token, session_id,
               timestamp, latitude, longitude
        FROM attendance_events
        WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
        ORDER BY timestamp DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(auth.user_id)
    .bind(since)
    .bind(until)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch attendance history");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        data: events,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
