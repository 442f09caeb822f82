//! apt-query - resolve APT package sets and write cache keys

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aptcache_cli::{Cli, Commands, cmd, executor};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    let executor = executor(cli.replay_file.as_deref())?;

    match cli.command {
        Commands::NormalizedList { names } => {
            cmd::normalized_list::normalized_list(executor.as_ref(), &names)
        }
        Commands::CreateKey {
            cache_dir,
            version,
            global_version,
            os_arch,
            packages,
        } => cmd::create_key::create_key(
            cache_dir,
            &version,
            &global_version,
            os_arch.as_deref(),
            &packages,
        ),
    }
}

/// Log to stderr, or with `debug` to an uncoloured `<exe>.log` whose
/// execution records can be fed back through `--replay-file`.
fn init_logging(debug: bool) -> Result<()> {
    if !debug {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let exe = std::env::current_exe().context("Failed to locate current executable")?;
    let log_path = format!("{}.log", exe.display());
    let file = File::create(&log_path).with_context(|| format!("Failed to create {log_path}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    tracing::debug!("Debug log at {log_path}");
    Ok(())
}
