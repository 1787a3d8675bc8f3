//! libyear - how many libyears behind is this Gemfile.lock?

use anyhow::Context;
use clap::Parser;
use libyear::cli::CliArgs;
use libyear::error::LockfileError;
use libyear::output::{create_reporter, OutputFormat};
use libyear::{analyze, logging};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let lockfile_path = args.lockfile_path();
    let lockfile_contents = match std::fs::read_to_string(&lockfile_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LockfileError::not_found(&lockfile_path).into());
        }
        Err(e) => return Err(LockfileError::read_error(&lockfile_path, e).into()),
    };

    let format = OutputFormat::from_cli(args.json);
    let config = args.into_config();
    let results = analyze(&lockfile_contents, &config).await?;

    let reporter = create_reporter(format, io::stdout().is_terminal());
    let mut stdout = io::stdout().lock();
    reporter
        .generate(&results, &mut stdout)
        .context("failed to write report")?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
