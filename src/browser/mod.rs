mod channel;
mod session;

pub use channel::PageChannel;
pub use session::{PageInfo, SessionManager, SessionState};
