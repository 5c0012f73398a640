pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

pub use commands::EngineError;
pub use events::SessionEvent;
pub use handle::EngineSession;
pub use snapshot::SessionSnapshot;
