pub mod error;
pub mod task;
pub mod codec;
pub mod config;
pub mod store;
pub mod ops;
pub mod report;
pub mod shell;

pub use error::{DecodeError, TaskError};
pub use task::{Credential, Field, Task, parse_date, format_date};
pub use config::{Config, ConfigManager, Paths, Scope};
pub use store::{LoadReport, Store};
pub use ops::{Action, Listing, Outcome, Selection};
pub use report::{ReportSet, TaskOverview, UserOverview};
pub use shell::Shell;
