pub mod password;
pub mod registration;
pub mod session;

pub use password::{forgot_password, reset_password};
pub use registration::signup;
pub use session::{current_session, login, logout, refresh_session};
