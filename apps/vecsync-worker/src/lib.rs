pub mod worker;

mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use error::{Error, Result};

#[derive(Debug, Parser)]
#[command(
	version = vecsync_cli::VERSION,
	rename_all = "kebab",
	styles = vecsync_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
	/// Run one reconciliation pass and exit.
	Run,
	/// Run passes until interrupted, sleeping `reconcile.poll_interval_ms` between them.
	Watch,
	/// Move `failed` (or never queued) records back to `pending`.
	Requeue {
		#[arg(required = true, value_name = "ID")]
		ids: Vec<i64>,
	},
	/// Return stale `processing` records to `pending`.
	Reclaim,
	/// Print per-status record counts as JSON.
	Stats,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = vecsync_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = vecsync_storage::db::Db::connect(&config.storage.postgres).await?;
	let store =
		vecsync_storage::records::PgRecordStore::new(db, config.storage.postgres.table.clone())?;

	match args.command {
		Command::Run => {
			let state = worker::WorkerState::new(&config, store)?;

			worker::run_once(&state).await?;
		},
		Command::Watch => {
			let state = worker::WorkerState::new(&config, store)?;

			worker::run_worker(state).await?;
		},
		Command::Requeue { ids } => {
			worker::requeue(&store, &ids).await?;
		},
		Command::Reclaim => {
			worker::reclaim(&store, &config.reconcile).await?;
		},
		Command::Stats => {
			println!("{}", worker::stats(&store).await?);
		},
	}

	Ok(())
}
