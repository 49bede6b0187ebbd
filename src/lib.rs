pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod progress;
pub mod schema;
pub mod source;
pub mod store;
pub mod ui;

pub use cli::{Cli, Commands};
pub use error::{ImportError, ImportResult};
pub use import::{ImportOrchestrator, ImportSummary, Stage, StageOptions};
pub use progress::{ImportProgressTracker, ImportRun, RunStatus};
pub use store::Store;
pub use ui::{Phase, SilentUi, Ui, UiApp};
