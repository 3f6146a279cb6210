pub mod memory;
pub mod session;

pub use memory::ConversationMemory;
pub use session::{ spawn_sweeper, SessionStore, DEFAULT_SESSION_ID };
