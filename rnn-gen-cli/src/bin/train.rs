//! Trains a next-character model on a text corpus and writes the model and
//! its bundle to a directory.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use rnn_gen_core::config::TrainingConfig;
use rnn_gen_core::pipeline::train;

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train a character model on a text corpus")]
struct Args {
	/// UTF-8 corpus file
	#[arg(long, default_value = "./corpi/foxinsocks.txt")]
	corpus: PathBuf,

	/// Output directory for model.bin and bundle.json
	#[arg(long, default_value = "./model")]
	model_dir: PathBuf,

	/// Number of context characters
	#[arg(long, default_value_t = 50)]
	window_length: usize,

	#[arg(long, default_value_t = 50)]
	epochs: usize,

	#[arg(long, default_value_t = 20)]
	batch_size: usize,
}

impl From<Args> for TrainingConfig {
	fn from(args: Args) -> Self {
		Self {
			corpus: args.corpus,
			model_dir: args.model_dir,
			window_length: args.window_length,
			epochs: args.epochs,
			batch_size: args.batch_size,
		}
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = TrainingConfig::from(Args::parse());
	let report = train(&config)?;

	info!("Saved model");
	println!(
		"{} characters, {} distinct, {} examples, {} contexts",
		report.characters, report.vocabulary_size, report.fit.examples, report.fit.contexts
	);
	println!("model:  {}", report.model_path.display());
	println!("bundle: {}", report.bundle_path.display());

	Ok(())
}
