use native_fingerprint::cli::Cli;
use native_fingerprint::theme::Theme;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.output_mode().log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", Theme::error("error:"), e);
            ExitCode::from(2)
        }
    }
}
