//! Binary entry point: resolve configuration, open the repository, then either
//! run a single subcommand or hand control to the terminal UI.
use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use musify::cli::{run_command, Args};
use musify::logging::init_logging;
use musify::{run_app, App, AppConfig, Repository};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::from_args(&args)?;
    init_logging(&config.log_path)?;
    info!(library = %config.library_path.display(), "starting musify");

    let mut repo = Repository::open(&config)?;
    if args.force {
        repo.discard_skipped_lines();
    }

    if let Some(command) = args.command {
        return run_command(&mut repo, command, &mut io::stdout().lock());
    }

    let profile = match config.profile.as_deref() {
        Some(name) => Some(repo.ensure_profile(name)?),
        None => None,
    };
    let mut app = App::new(repo, profile);
    run_app(&mut app)
}
