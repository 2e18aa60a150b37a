pub mod clock;
pub mod interns;
pub mod store;
pub mod tasks;
