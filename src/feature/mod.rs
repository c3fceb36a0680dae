//! Features of the application, each with its API, service and repository.

pub mod item;
