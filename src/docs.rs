use crate::api::attendance::{HistoryResponse, RecordEventReq, RecordEventResponse};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::api::qr::{IssueQrReq, QrTokenResponse};
use crate::api::report::{SessionsResponse, SummaryResponse, UserSummaryRow};
use crate::api::users::{UserFilter, UserListResponse, UserResponse};
use crate::api::wfh::{CreateWfh, WfhFilter, WfhListResponse};
use crate::attendance::hours::HoursSummary;
use crate::model::attendance_event::{AttendanceEvent, EventType, Method};
use crate::model::session::Session;
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendly API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracking

This API powers an **attendance tracking** service for organizations.

### 🔹 Key Features
- **Accounts**
  - Register, admin approval, login with JWT token pairs
- **Attendance**
  - Check-in / check-out via QR codes, NFC/RFID badges or manual admin entry
  - Session pairing and working-hours aggregation
- **Leave & WFH**
  - Submit requests, approve/reject workflows
- **Reports**
  - Session lists and per-user hour rollups for dashboards and exports

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
QR check-in codes are short-lived capability tokens minted by admins.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::history,

        crate::api::qr::issue_qr,

        crate::api::report::sessions,
        crate::api::report::summary,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::wfh::create_wfh,
        crate::api::wfh::wfh_list,
        crate::api::wfh::approve_wfh,
        crate::api::wfh::reject_wfh,

        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::approve_user,
        crate::api::users::reject_user
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            RecordEventReq,
            RecordEventResponse,
            HistoryResponse,
            AttendanceEvent,
            EventType,
            Method,
            Session,
            HoursSummary,
            IssueQrReq,
            QrTokenResponse,
            SessionsResponse,
            SummaryResponse,
            UserSummaryRow,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            CreateWfh,
            WfhFilter,
            WfhListResponse,
            UserFilter,
            UserResponse,
            UserListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and token APIs"),
        (name = "Attendance", description = "Check-in/check-out and QR APIs"),
        (name = "Reports", description = "Session and working-hours APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "WFH", description = "Work-from-home request APIs"),
        (name = "Users", description = "Account administration APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
