use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = chakula_recommend::Args::parse();

	chakula_recommend::run(args).await
}
