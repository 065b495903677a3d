use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = gbid_api::Args::parse();

	gbid_api::run(args).await
}
