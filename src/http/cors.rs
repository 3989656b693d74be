use crate::cli::Args;
use axum::http::HeaderValue;
use http::Method;
use tower_http::cors::CorsLayer;

pub fn layer(args: &Args) -> CorsLayer {
    let origins: Vec<HeaderValue> = args
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .expect("Failed to parse a configured CORS origin.")
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_headers([
            "User-Agent".parse().unwrap(),
            "Sec-Fetch-Mode".parse().unwrap(),
            "Referer".parse().unwrap(),
            "Origin".parse().unwrap(),
            "Access-Control-Request-Method".parse().unwrap(),
            "Access-Control-Request-Headers".parse().unwrap(),
            "content-type".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}
