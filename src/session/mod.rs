//! Session lifecycle: lazy creation, explicit reset, idle eviction

pub mod store;
pub mod sweeper;

pub use store::{SessionHandle, SessionStore, StoreSettings};
pub use sweeper::Sweeper;
