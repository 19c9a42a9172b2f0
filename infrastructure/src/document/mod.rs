//! Discussion document persistence

mod store;

pub use store::{DOCUMENT_FILE, FsDiscussionStore, PLAN_FILE, STATE_FILE};
