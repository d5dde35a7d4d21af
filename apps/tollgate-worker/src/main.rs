use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = tollgate_worker::Args::parse();

	tollgate_worker::run(args).await
}
