use crate::auth::auth::AuthUser;
use crate::model::wfh_request::WfhRequest;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateWfh {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "Plumber visit")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WfhFilter {
    /// Filter by user ID (admin)
    pub user_id: Option<u64>,
    /// Filter by request status
    #[param(example = "pending")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct WfhListResponse {
    pub data: Vec<WfhRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Submit a work-from-home request
#[utoipa::path(
    post,
    path = "/api/v1/wfh",
    request_body = CreateWfh,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "message": "WFH request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "WFH"
)]
pub async fn create_wfh(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateWfh>,
) -> actix_web::Result<impl Responder> {
    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO wfh_requests (user_id, start_date, end_date, reason)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.as_deref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create WFH request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "WFH request submitted",
        "status": "pending"
    })))
}

/// List work-from-home requests
#[utoipa::path(
    get,
    path = "/api/v1/wfh",
    params(WfhFilter),
    responses(
        (status = 200, description = "Paginated WFH list", body = WfhListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "WFH"
)]
pub async fn wfh_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WfhFilter>,
) -> actix_web::Result<impl Responder> {
    let user_filter = if auth.is_admin() {
        query.user_id
    } else {
        Some(auth.user_id)
    };

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    if user_filter.is_some() {
        where_sql.push_str(" AND user_id = ?");
    }
    if query.status.is_some() {
        where_sql.push_str(" AND status = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM wfh_requests{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(user_id) = user_filter {
        count_q = count_q.bind(user_id);
    }
    if let Some(status) = query.status.as_deref() {
        count_q = count_q.bind(status);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count WFH requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, user_id, start_date, end_date, reason, status, created_at
        FROM wfh_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, WfhRequest>(&data_sql);
    if let Some(user_id) = user_filter {
        data_q = data_q.bind(user_id);
    }
    if let Some(status) = query.status.as_deref() {
        data_q = data_q.bind(status);
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch WFH list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(WfhListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

async fn set_wfh_status(pool: &MySqlPool, wfh_id: u64, to: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE wfh_requests
        SET status = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(to)
    .bind(wfh_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Approve a WFH request (admin)
#[utoipa::path(
    put,
    path = "/api/v1/wfh/{wfh_id}/approve",
    params(("wfh_id" = u64, Path, description = "ID of the WFH request")),
    responses(
        (status = 200, description = "WFH approved"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "WFH"
)]
pub async fn approve_wfh(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let wfh_id = path.into_inner();

    let affected = set_wfh_status(pool.get_ref(), wfh_id, "approved")
        .await
        .map_err(|e| {
            tracing::error!(error = %e, wfh_id, "Approve WFH failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "WFH request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "WFH approved"
    })))
}

/// Reject a WFH request (admin)
#[utoipa::path(
    put,
    path = "/api/v1/wfh/{wfh_id}/reject",
    params(("wfh_id" = u64, Path, description = "ID of the WFH request")),
    responses(
        (status = 200, description = "WFH rejected"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "WFH"
)]
pub async fn reject_wfh(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let wfh_id = path.into_inner();

    let affected = set_wfh_status(pool.get_ref(), wfh_id, "rejected")
        .await
        .map_err(|e| {
            tracing::error!(error = %e, wfh_id, "Reject WFH failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "WFH request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "WFH rejected"
    })))
}
