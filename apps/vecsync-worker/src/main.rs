use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vecsync_worker::Args::parse();

	vecsync_worker::run(args).await
}
