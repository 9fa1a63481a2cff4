pub mod attendance_event;
pub mod role;
pub mod session;
pub mod wfh_request;
