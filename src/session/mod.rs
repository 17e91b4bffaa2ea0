//! Auth session and global notification state.

mod state;
mod storage;
mod store;

pub use state::{Action, AppState, NoticeKind, Notification, User};
pub use storage::{BrowserStorage, MemoryStorage};
pub use store::Store;
