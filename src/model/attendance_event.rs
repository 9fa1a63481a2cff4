use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Direction of an attendance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum EventType {
    In,
    Out,
}

/// How the credential was presented at the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Method {
    Qr,
    Nfc,
    Rfid,
    Manual,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Qr => "QR",
            Method::Nfc => "NFC",
            Method::Rfid => "RFID",
            Method::Manual => "MANUAL",
        }
    }
}

/// One row of the append-only attendance ledger.
///
/// `session_id` is assigned by the reconciler at admission time: a fresh
/// value for an IN, the open IN's value for the matching OUT. Rows are
/// never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AttendanceEvent {
    pub id: u64,
    pub user_id: u64,
    pub event_type: EventType,
    pub method: Method,
    /// Credential presented at the scan (QR token string or NFC/RFID tag id).
    pub token: String,
    #[schema(example = "7f1c9a4e-1d2b-4b6e-9c1f-2a3b4c5d6e7f", value_type = String)]
    pub session_id: String,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
