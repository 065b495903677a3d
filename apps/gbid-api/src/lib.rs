pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;

use state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = gbid_cli::VERSION,
	rename_all = "kebab",
	styles = gbid_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = gbid_config::load(&args.config)?;

	gbid_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse().map_err(|err| {
		eyre::eyre!("Invalid service.http_bind {:?}: {err}", config.service.http_bind)
	})?;
	let strategy = config.retrieval.strategy.as_str();
	let state = AppState::new(config);
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, strategy, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}
