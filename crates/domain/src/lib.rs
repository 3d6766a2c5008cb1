//! Domain layer for the dispatch tracking backend.
//!
//! Holds the entities, the dispatch lifecycle state machine, the error
//! taxonomy and the repository abstractions. Nothing in this crate knows
//! about HTTP or SQL; the api and infrastructure crates depend on it,
//! never the other way around.

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;

pub use entities::{CreateUser, Dispatch, DispatchFilter, DispatchStatus, PodDetails, User};
pub use errors::{DispatchError, DispatchResult};
pub use repositories::{DispatchRepository, UserRepository};
pub use services::DispatchService;
