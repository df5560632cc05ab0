//! In-memory stand-in for the property listing backend.
//!
//! Serves the JSON/multipart API the admin client talks to under `/api`,
//! and uploaded image bytes under `/storage`.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod models;
pub mod store;

pub use store::Store;

pub type Db = Arc<RwLock<Store>>;

/// Router over an empty store.
pub fn app() -> Router {
    app_with_store(Store::default())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));

    let protected = Router::new()
        .route(
            "/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route(
            "/properties/{id}",
            get(handlers::get_property)
                .post(handlers::update_property)
                .delete(handlers::delete_property),
        )
        .route_layer(middleware::from_fn_with_state(db.clone(), handlers::require_token));

    let api = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .route("/storage/{*path}", get(handlers::storage))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}
