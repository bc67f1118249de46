//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI args
//! and runs the operation against a loaded [`SyncEngine`](crate::sync::SyncEngine).

pub mod add;
pub mod config;
pub mod get;
pub mod rm;
pub mod search;
pub mod set;
pub mod status;
pub mod tree;

// Re-export execute functions for convenience
pub use add::execute as add;
pub use self::config::execute as config;
pub use get::execute as get;
pub use rm::execute as rm;
pub use rm::execute_folder as rmdir;
pub use search::execute as search;
pub use set::execute as set;
pub use status::execute as status;
pub use tree::execute as tree;
