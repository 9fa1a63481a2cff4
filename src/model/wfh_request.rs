use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WfhRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "Plumber visit", nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "pending", nullable = true)]
    pub status: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}
