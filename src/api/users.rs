use crate::auth::auth::AuthUser;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

// Columns an admin may touch through the dynamic update endpoint.
// Password and email stay out: password changes go through auth, email is
// the login identity and mirrored in the availability filter.
const UPDATABLE_COLUMNS: &[&str] = &["full_name", "role_id", "rfid_tag", "status"];

#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(example = "tag-0042", value_type = String)]
    pub rfid_tag: Option<String>,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct UserFilter {
    /// Filter by account status (pending, active, disabled)
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// List users (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserFilter),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    if query.status.is_some() {
        where_sql.push_str(" AND status = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM users{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(status) = query.status.as_deref() {
        count_q = count_q.bind(status);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, full_name, email, role_id, rfid_tag, status
        FROM users
        {}
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, UserResponse>(&data_sql);
    if let Some(status) = query.status.as_deref() {
        data_q = data_q.bind(status);
    }

    let users = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch user list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Fetch one user (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let user = sqlx::query_as::<_, UserResponse>(
        r#"
        SELECT id, full_name, email, role_id, rfid_tag, status
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, user_id, "Failed to fetch user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match user {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        }))),
    }
}

/// Partial user update (admin)
///
/// Accepts a sparse JSON object; allowed columns include `rfid_tag` for
/// badge assignment.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body(content = Object, example = json!({"rfid_tag": "tag-0042"})),
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Unknown field or empty payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let update = build_update_sql("users", &payload, UPDATABLE_COLUMNS, "id", user_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, user_id, "Failed to update user");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated"
    })))
}

async fn set_status(
    pool: &MySqlPool,
    user_id: u64,
    from: &str,
    to: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(to)
    .bind(user_id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Approve a pending registration (admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/approve",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account approved", body = Object, example = json!({
            "message": "Account approved"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn approve_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let affected = set_status(pool.get_ref(), user_id, "pending", "active")
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Approve user failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "User not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Account approved"
    })))
}

/// Reject a pending registration (admin)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/reject",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account rejected", body = Object, example = json!({
            "message": "Account rejected"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn reject_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let affected = set_status(pool.get_ref(), user_id, "pending", "disabled")
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Reject user failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "User not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Account rejected"
    })))
}
