pub mod config;
pub mod errors;
pub mod explorer;
pub mod locations;
pub mod log;
pub mod paths;
pub mod storage;

pub use config::{ExplorerConfig, SeedProject};
pub use errors::{ExplorerError, ExplorerErrorType, Result};
pub use explorer::{Explorer, FileView, FolderContents, Item, SerializedTree, Tab};
pub use paths::ItemKind;
pub use storage::{MemoryStore, PersistenceAdapter, SledStore};
