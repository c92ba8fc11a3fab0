mod error;
mod handler;
mod router;

pub use error::{ApiErrorCode, ApiRejection, recover_error};
pub use router::{AUTHORIZATION_HEADER, REFRESH_TOKEN_HEADER, routes};
