pub mod attendance;
pub mod leave_request;
pub mod qr;
pub mod report;
pub mod users;
pub mod wfh;
