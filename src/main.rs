use clap::Parser;
use mammothbench::bench::SweepController;
use mammothbench::cli::{Cli, OutputFormat};
use mammothbench::error::user_friendly_message;
use mammothbench::io::{create_disk_io, DiskIO};
use mammothbench::logging::init_logging;
use mammothbench::report::{JsonReporter, Reporter, TableReporter};
use mammothbench::{MammothError, Result};
use std::process::ExitCode;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(?err, "benchmark aborted");
            eprintln!("{}", err);
            if let Some(hint) = user_friendly_message(&err) {
                eprintln!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file = cli.load_config_file()?;
    let config = cli.resolve(file.as_ref())?;
    let controller = SweepController::new(config.clone())?;

    let disk_io = create_disk_io(config.direct_io);
    let target = disk_io
        .open_target(&config.target)
        .map_err(|source| MammothError::TargetOpenError {
            path: config.target.clone(),
            source,
        })?;
    info!(
        "Opened {} ({})",
        config.target.display(),
        if config.direct_io { "direct I/O" } else { "buffered I/O" }
    );

    let mut reporter: Box<dyn Reporter> = match cli.format {
        OutputFormat::Table => Box::new(TableReporter::new(std::io::stdout())),
        OutputFormat::Json => Box::new(JsonReporter::new(std::io::stdout())),
    };

    controller.run(target, reporter.as_mut()).await
}
