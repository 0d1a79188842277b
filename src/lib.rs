pub mod commands;
pub mod events;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
pub mod surface;
pub mod view;

pub use commands::{CommandCtx, CommandResult};
pub use events::ViewPayload;
pub use models::{CorruptDataPolicy, SortDirection, StatusFilter, Task, TaskError, ViewQuery};
pub use state::AppState;
pub use storage::{FileStore, KeyValueStore, LoadOutcome, MemoryStore, Storage, StorageError};
