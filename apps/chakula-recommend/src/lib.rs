use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use tracing_subscriber::EnvFilter;

use chakula_domain::NutrientProfile;
use chakula_service::ChakulaService;

#[derive(Debug, Parser)]
#[command(
	version = chakula_cli::VERSION,
	rename_all = "kebab",
	styles = chakula_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON nutrient profile. Short keys (`energy`) and per-serving keys
	/// (`Energy_kcal_per_serving`) are both accepted.
	#[arg(
		long,
		short = 'p',
		value_name = "FILE",
		required_unless_present_any = ["history", "clear_history"]
	)]
	pub profile: Option<PathBuf>,
	#[arg(long, short = 'k', value_name = "N")]
	pub top_k: Option<u32>,
	/// Skip the primary recommender and answer from the local corpus.
	#[arg(long)]
	pub offline: bool,
	/// Print the stored recommendation history instead of recommending.
	#[arg(long, conflicts_with = "clear_history")]
	pub history: bool,
	#[arg(long)]
	pub clear_history: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut config = chakula_config::load(&args.config)?;

	init_tracing(&config);

	if args.offline {
		config.recommend.offline_mode = true;
	}

	let service = ChakulaService::new(config);

	if args.clear_history {
		service.history.clear().await?;

		tracing::info!("Recommendation history cleared.");

		return Ok(());
	}
	if args.history {
		let json = serde_json::to_string_pretty(&service.history.entries().await?)?;

		println!("{json}");

		return Ok(());
	}

	let Some(profile_path) = args.profile.as_deref() else {
		return Err(eyre::eyre!("A profile file is required."));
	};
	let profile = read_profile(profile_path)?;
	let top_k = args.top_k.unwrap_or(service.cfg.recommend.default_top_k);
	let result = service.recommend(&profile, top_k).await;
	let json = serde_json::to_string_pretty(&result)?;

	println!("{json}");

	Ok(())
}

pub fn read_profile(path: &Path) -> color_eyre::Result<NutrientProfile> {
	let raw = fs::read_to_string(path)
		.wrap_err_with(|| format!("Failed to read profile {}.", path.display()))?;
	let value: serde_json::Value = serde_json::from_str(&raw)
		.wrap_err_with(|| format!("Profile {} is not valid JSON.", path.display()))?;

	if !value.is_object() {
		return Err(eyre::eyre!("Profile {} must be a JSON object.", path.display()));
	}

	Ok(NutrientProfile::from_json(&value))
}

fn init_tracing(config: &chakula_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use std::env;

	use super::*;
	use chakula_domain::Nutrient;

	#[test]
	fn profile_is_required_unless_reading_history() {
		assert!(Args::try_parse_from(["chakula-recommend", "--config", "c.toml"]).is_err());

		let args = Args::try_parse_from(["chakula-recommend", "-c", "c.toml", "--history"])
			.expect("history mode must parse");

		assert!(args.history);
		assert!(args.profile.is_none());

		let args = Args::try_parse_from([
			"chakula-recommend",
			"-c",
			"c.toml",
			"--profile",
			"p.json",
			"--top-k",
			"3",
			"--offline",
		])
		.expect("recommend mode must parse");

		assert_eq!(args.top_k, Some(3));
		assert!(args.offline);
	}

	#[test]
	fn reads_per_serving_profile_keys() {
		let mut path = env::temp_dir();

		path.push(format!("chakula_profile_test_{}.json", std::process::id()));
		fs::write(
			&path,
			r#"{"Energy_kcal_per_serving": "250", "Iron_mg_per_serving": 4, "region_encoded": 2}"#,
		)
		.expect("Failed to write profile.");

		let profile = read_profile(&path).expect("profile must load");

		fs::remove_file(&path).expect("Failed to remove profile.");

		assert_eq!(profile.get(Nutrient::Energy), Some(250.0));
		assert_eq!(profile.get(Nutrient::Iron), Some(4.0));
		assert_eq!(profile.region_code, Some(2));
	}
}
