use crate::cli::Args;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn init(_args: &Args) {
    let env_filter = EnvFilter::default().add_directive("resizer_server=info".parse().unwrap());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}
