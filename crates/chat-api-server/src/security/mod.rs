pub mod header_validator;
pub mod middleware;

pub use header_validator::AdminKeyValidator;
