// Tasks live inside intern documents; nothing here talks to a table directly
pub mod codec;
pub mod model;
pub mod summary;

pub use codec::ValidationError;
pub use model::{Task, TaskEntry, TaskPayload, TaskStatus};
pub use summary::{summarize, TaskSummary};
