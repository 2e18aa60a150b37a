pub mod error;
pub mod model;
pub mod query;
pub mod service;

pub use error::InternError;
pub use model::{CreateInternPayload, Intern, InternPage, UpdateInternPayload};
pub use query::{build_queries, ListParams};
