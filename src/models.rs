use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: String,
    pub password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub status: String,
}

/// Identity-token claims: who the bearer is.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub role: u8,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Capability-token claims: what the bearer may do, independent of who
/// they are. Carried by the QR codes posted at checkpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AttendanceClaims {
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}
