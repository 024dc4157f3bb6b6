use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(hb_cli::DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    std::process::exit(hb_cli::run_cli_from_args(std::env::args_os()));
}
