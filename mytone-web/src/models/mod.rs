pub mod identity;
pub mod news;

pub use identity::{AdminRecord, Identity, NewUser, Role, SanitizedUser, UserRecord};
pub use news::{Language, LocalizedNews, LocalizedPair, NewsDraft, NewsItem};
