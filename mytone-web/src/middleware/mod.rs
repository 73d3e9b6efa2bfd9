pub mod guard;
pub mod session;

pub use guard::{evaluate, session_guard_middleware, GuardDecision};
pub use session::{AdminPage, AdminSession, CurrentSession, MaybeSession, SignedInPage};
