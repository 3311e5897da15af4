pub mod auth;
pub mod response;

pub use auth::Identity;
pub use response::{Alerts, ApiResponse, ApiResult};
