//! Repository abstractions.
//!
//! Data access interfaces the infrastructure crate implements; services
//! depend on these trait objects only.

use async_trait::async_trait;

use crate::entities::{CreateUser, Dispatch, DispatchFilter, User};
use crate::errors::DispatchResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &CreateUser) -> DispatchResult<User>;
    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DispatchResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DispatchResult<Option<User>>;
}

#[async_trait]
pub trait DispatchRepository: Send + Sync {
    async fn create(&self, dispatch: &Dispatch) -> DispatchResult<Dispatch>;
    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<Dispatch>>;
    /// Storage-order listing; offset/limit and equality predicates come from
    /// the filter, absent predicates impose no constraint.
    async fn list(&self, filter: &DispatchFilter) -> DispatchResult<Vec<Dispatch>>;
    async fn count(&self, filter: &DispatchFilter) -> DispatchResult<i64>;
    async fn update(&self, dispatch: &Dispatch) -> DispatchResult<()>;
}
