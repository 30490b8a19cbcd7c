use clap::Parser;
use leasehold::{runner, Args};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet);

    let settings = match args.into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("leasehold: {}", e.report());
            return ExitCode::FAILURE;
        }
    };

    match runner::execute(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("leasehold: {}", e.report());
            ExitCode::FAILURE
        }
    }
}
