pub mod auth;
pub mod dispatches;
pub mod health;
