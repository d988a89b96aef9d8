pub mod annotate;
pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod draft;
pub mod events;
pub mod initial_date;
pub mod interaction;
pub mod model;
pub mod mutation;
pub mod pairing;
pub mod render;
pub mod store;

use std::ffi::OsString;
use std::io;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    command = cli.command.name(),
    "starting rota CLI"
  );

  let cfg = config::RotaConfig::load(
    cli.config.as_deref()
  )
  .context("failed to load config")?;
  debug!(
    timezone = %cfg.timezone(),
    tags = cfg.tags.len(),
    "config ready"
  );

  let schedule =
    commands::load_schedule(
      &cli.schedule
    )
    .with_context(|| {
      format!(
        "failed to open schedule {}",
        Path::new(&cli.schedule)
          .display()
      )
    })?;

  let mut store =
    store::ScheduleStore::new(schedule);
  let renderer =
    render::Renderer::new(&cfg);

  commands::dispatch(
    &mut store,
    &cfg,
    &renderer,
    cli.json,
    io::stdout().lock(),
    cli.command
  )?;

  info!("done");
  Ok(())
}
