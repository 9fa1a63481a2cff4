use crate::auth::auth::AuthUser;
use crate::auth::jwt::{self, ATTENDANCE_PURPOSE};
use crate::config::Config;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct IssueQrReq {
    /// Minutes until the code stops working. Defaults from config.
    #[schema(example = 10)]
    pub expires_in_minutes: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct QrTokenResponse {
    /// Signed token to embed in the rendered QR code
    pub value: String,
    #[schema(example = "attendance")]
    pub purpose: String,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub issued_at: chrono::DateTime<Utc>,
    #[schema(example = "2026-01-01T09:10:00Z", format = "date-time", value_type = String)]
    pub expires_at: chrono::DateTime<Utc>,
}

/// Mint a checkpoint QR token (admin)
///
/// The token is a bearer capability: until it expires, any authenticated
/// user may redeem it, any number of times. It identifies a checkpoint,
/// not a person, so there is no one-time-use tracking and no revocation.
#[utoipa::path(
    post,
    path = "/api/v1/qr",
    request_body = IssueQrReq,
    responses(
        (status = 200, description = "QR token minted", body = QrTokenResponse),
        (status = 400, description = "TTL out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn issue_qr(
    auth: AuthUser,
    config: web::Data<Config>,
    payload: web::Json<IssueQrReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let minutes = payload.expires_in_minutes.unwrap_or(config.qr_token_ttl_min);
    if minutes == 0 || minutes > 24 * 60 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "expires_in_minutes must be between 1 and 1440"
        })));
    }

    let value = jwt::generate_attendance_token(ATTENDANCE_PURPOSE, minutes, &config.jwt_secret)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign attendance token");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let issued_at = Utc::now();

    Ok(HttpResponse::Ok().json(QrTokenResponse {
        value,
        purpose: ATTENDANCE_PURPOSE.to_string(),
        issued_at,
        expires_at: issued_at + Duration::minutes(minutes as i64),
    }))
}
