use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use dispatch_domain::DispatchService;

use crate::auth::service::AuthService;
use crate::handlers::auth::{login, refresh, signup};
use crate::handlers::dispatches::{
    accept_dispatch, complete_dispatch, create_dispatch, filter_dispatches, get_dispatch,
    list_dispatches, my_dispatches, start_dispatch,
};
use crate::handlers::health::health_check;

#[derive(Clone)]
pub struct AppState {
    pub dispatch_service: Arc<DispatchService>,
    pub auth_service: Arc<AuthService>,
}

/// Public routes plus the bearer-guarded dispatch surface.
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/dispatches", get(list_dispatches).post(create_dispatch))
        .route("/api/dispatches/filter", get(filter_dispatches))
        .route("/api/dispatches/mine", get(my_dispatches))
        .route("/api/dispatches/{id}", get(get_dispatch))
        .route("/api/dispatches/{id}/accept", post(accept_dispatch))
        .route("/api/dispatches/{id}/start", post(start_dispatch))
        .route("/api/dispatches/{id}/complete", post(complete_dispatch))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .merge(protected)
        .with_state(state)
}
