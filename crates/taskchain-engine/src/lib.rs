/*
[INPUT]:  Public API exports for the taskchain-engine crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod app;
pub mod connection;
pub mod session;
pub mod store;
pub mod sync;
pub mod watcher;
pub mod writer;

// Re-export main types for convenience
pub use app::TaskchainApp;
pub use connection::ConnectionManager;
pub use session::ClientCell;
pub use store::{Action, AppState, LogEntry, NoticeEntry, Store};
pub use sync::ReadSynchronizer;
pub use watcher::{EventWatcher, RELOAD_DEBOUNCE};
pub use writer::WriteOrchestrator;
