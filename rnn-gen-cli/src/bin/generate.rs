//! Generates text from a trained model directory.
//!
//! Prints `>` followed by the seed window, then the generated characters on
//! the next line.

use std::path::PathBuf;

use clap::Parser;
use rnn_gen_core::config::{DEFAULT_SEED, GenerationConfig};
use rnn_gen_core::pipeline::TrainedModel;
use rnn_gen_core::text::normalizer::normalize;

#[derive(Parser, Debug)]
#[command(name = "generate", about = "Generate text from a trained character model")]
struct Args {
	/// Directory holding model.bin and bundle.json
	#[arg(long, default_value = "./model")]
	model_dir: PathBuf,

	/// Seed text, cleaned like the corpus; must hold at least one window
	#[arg(long, default_value = DEFAULT_SEED)]
	seed: String,

	/// Character offset of the first window inside the seed
	#[arg(long, default_value_t = 0)]
	seed_offset: usize,

	/// Number of characters to generate
	#[arg(long, default_value_t = 100)]
	length: usize,

	/// Sampling temperature (0 = near arg-max, higher = more random)
	#[arg(long, default_value_t = 0.0)]
	temperature: f32,

	/// Random seed for reproducible output
	#[arg(long)]
	rng_seed: Option<u64>,
}

impl From<Args> for GenerationConfig {
	fn from(args: Args) -> Self {
		Self {
			seed: normalize(&args.seed),
			seed_offset: args.seed_offset,
			sample_count: args.length,
			temperature: args.temperature,
			rng_seed: args.rng_seed,
		}
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let model = TrainedModel::load(&args.model_dir)?;
	let generated = model.generate(&GenerationConfig::from(args))?;

	println!("{generated}");
	Ok(())
}
