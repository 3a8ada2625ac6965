//! Session tokens and the stores that hold them.

pub mod errors;
pub mod file_store;
pub mod store;
pub mod types;

pub use errors::SessionError;
pub use file_store::{
    FileSessionStore, load_session_file, remove_session_file, save_session_file,
};
pub use store::{MemorySessionStore, SessionStore};
pub use types::{Session, SessionHealth};
