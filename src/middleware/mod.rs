pub mod auth;
pub mod invoke_request;

pub use auth::RequireKeyAuth;
pub use invoke_request::InvokePreprocess;
