pub mod config;
pub mod registry;

pub mod certificate;
mod context;
mod error;
mod handlers;
pub mod issuance;

pub use context::AppContext;
pub use error::{lambda_error, AppError, ErrorBody, INCOMPLETE_ISSUANCE_MESSAGE};
pub use handlers::{echo_request, handle_request};
