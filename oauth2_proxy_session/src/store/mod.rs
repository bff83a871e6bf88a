mod cookie;
mod factory;
mod redis;
mod ticket;
mod types;

pub use cookie::CookieSessionStore;
pub use factory::{SessionStoreType, new_session_store};
pub use self::redis::RedisSessionStore;
pub use ticket::Ticket;
pub use types::SessionStore;
