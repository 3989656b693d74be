use crate::cli::Args;
use crate::http::{cors, middleware};
use crate::{health, resize};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};

pub fn new(args: &Args) -> Router {
    let cors_policy = cors::layer(args);
    tracing::info!("Initialized HTTP configuration.");

    let health_routes = Router::new().route("/check", get(health::handlers::healthcheck));
    let resize_routes = Router::new()
        .route("/images", post(resize::handlers::resize_images))
        .layer(DefaultBodyLimit::max(args.max_upload_bytes));

    Router::new()
        .nest("/health", health_routes)
        .nest("/resize", resize_routes)
        .layer(cors_policy)
        .layer(axum::middleware::from_fn(middleware::tracing))
}
