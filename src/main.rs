use clap::Parser as _;
use tracing::debug;

use folio::application::data::LogLevel;
use folio::application::{Application, ApplicationError, RuntimeConfig};
use folio::cli::Cli;

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), ApplicationError> {
    let cli_args = Cli::parse();
    let cli_level = cli_args.log_level;
    let runtime = RuntimeConfig::from(cli_args);

    let settings = Application::load_settings(&runtime).await?;
    setup_tracing(cli_level.or(settings.log_level).unwrap_or_default());
    debug!("Runtime configuration: {runtime:?}");

    let output = Application::run(runtime, &settings).await?;
    println!("{}", output.trim_end());

    Ok(())
}

fn setup_tracing(level: LogLevel) {
    if let Some(level) = level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .without_time()
            .compact()
            .init();
    }
}
