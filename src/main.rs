mod api;
mod app;
mod commands;
mod config;
mod event;
mod fetch;
mod format;
mod ui;

use api::types::PointOfView;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fairway")]
#[command(about = "A terminal console for sale associates of the Fairway golf marketplace")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fairway/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Acting role for queries: associate (default) or consumer
  #[arg(short, long)]
  viewpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;

  let point_of_view = match args.viewpoint.as_deref() {
    None | Some("associate") | Some("sale-associate") => PointOfView::SaleAssociate,
    Some("consumer") => PointOfView::Consumer,
    Some(other) => {
      return Err(eyre!(
        "Unknown viewpoint: {} (expected associate or consumer)",
        other
      ))
    }
  };

  let _log_guard = init_tracing()?;

  let mut app = app::App::new(config, point_of_view)?;
  app.run().await?;

  Ok(())
}

/// Logs go to a file under the state directory: the terminal itself is
/// in raw mode while the app runs.
fn init_tracing() -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
  let Some(dir) = dirs::state_dir().or_else(dirs::cache_dir) else {
    return Ok(None);
  };
  let dir = dir.join("fairway");
  std::fs::create_dir_all(&dir)?;

  let appender = tracing_appender::rolling::daily(dir, "fairway.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fairway=info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(Some(guard))
}
