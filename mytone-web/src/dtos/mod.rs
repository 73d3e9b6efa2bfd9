pub mod auth;
pub mod news;

pub use mytone_core::error::ErrorBody;
