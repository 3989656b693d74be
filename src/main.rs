use crate::cli::Args;
use clap::Parser;

mod cli;
mod health;
mod http;
mod logging;
mod resize;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(&args);

    let router = http::router::new(&args);
    let listener = tokio::net::TcpListener::bind(args.listen_address)
        .await
        .expect("Failed to bind the listen address.");
    tracing::info!("Listening on {}.", args.listen_address);

    axum::serve(listener, router)
        .await
        .expect("Failed to run the HTTP server.");
}
