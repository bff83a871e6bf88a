mod codec;
mod errors;
mod manager;
mod state;

pub use codec::{decode_session_state, encode_session_state};
pub use errors::SessionError;
pub use manager::SessionManager;
pub use state::SessionState;
