pub mod auth;
pub mod error;
pub mod jwt;
pub mod response;
pub mod retry;

pub use error::AppError;
pub use response::BaseResponse;
#[allow(unused_imports)]
pub use response::ErrorResponse;
