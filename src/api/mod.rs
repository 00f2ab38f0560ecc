//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

mod aliases;
mod current_user;
mod links;
mod options;
mod request;
mod response;
mod users;

/// Get the Axum router for all API routes
pub fn router() -> Router {
    let users = Router::new()
        .route("/token", post(users::token))
        .route("/", post(users::create))
        .route("/me", get(users::me));

    let links = Router::new()
        .route("/", get(links::list))
        .route("/", post(links::create))
        .route("/{link}", get(links::single))
        .route("/{link}", patch(links::update))
        .route("/{link}", delete(links::delete))
        .route("/{link}/metadata", post(links::refresh_metadata));

    let options = Router::new()
        .route("/", get(options::list))
        .route("/{name}", put(options::update));

    let aliases = Router::new().route("/random", get(aliases::random));

    Router::new()
        .nest("/users", users)
        .nest("/links", links)
        .nest("/options", options)
        .nest("/aliases", aliases)
}
