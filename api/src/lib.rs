//! HTTP API for wicket.
//!
//! Routes under `/api/v1`:
//! - `/users` — directory CRUD, badge lookup, `me`
//! - `/users/auth` — login, logout, session refresh
//! - `/promotions` — granting, listing, revoking and redeeming promotion
//!   passes
//!
//! Authentication rides a `session` cookie; every request resolves it to
//! a [`wicket_types::Actor`] and the service layer decides what that
//! actor may do.

pub mod auth;
pub mod error;
pub mod promotions;
pub mod server;
pub mod users;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use wicket_identity::Directory;

pub use error::ApiError;
pub use server::{ApiServer, ServerError};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub directory: Directory,
}

/// Build the `/api/v1` router. Unknown API paths get a JSON 404.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/me", get(users::me))
        .route("/users/auth", post(users::login).delete(users::logout))
        .route("/users/auth/refresh", post(users::refresh))
        .route("/users/badge/:badge", get(users::get_by_badge))
        .route(
            "/users/:id",
            get(users::get).patch(users::patch).delete(users::delete),
        )
        .route(
            "/promotions",
            get(promotions::list).post(promotions::grant),
        )
        .route(
            "/promotions/:id",
            get(promotions::get).delete(promotions::revoke),
        )
        .route("/promotions/:id/redeem", post(promotions::redeem))
        .fallback(error::not_found)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
}
