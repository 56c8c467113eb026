use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::adapter::FitOptions;

/// File name of the serialized model inside a model directory.
pub const MODEL_FILE: &str = "model.bin";

/// File name of the bundle inside a model directory.
pub const BUNDLE_FILE: &str = "bundle.json";

/// Seed text used when none is given.
pub const DEFAULT_SEED: &str = "fox socks box knox knox in box fox in socks knox on fox in socks in box socks on knox and knox in box fox in socks on box on knox";

/// Settings for a training run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
	/// UTF-8 text file to learn from.
	pub corpus: PathBuf,
	/// Directory receiving `model.bin` and `bundle.json`.
	pub model_dir: PathBuf,
	/// Characters of context used to predict the next one.
	pub window_length: usize,
	pub epochs: usize,
	pub batch_size: usize,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			corpus: PathBuf::from("./corpi/foxinsocks.txt"),
			model_dir: PathBuf::from("./model"),
			window_length: 50,
			epochs: 50,
			batch_size: 20,
		}
	}
}

impl TrainingConfig {
	/// # Errors
	/// Returns a configuration error if the window, epoch count or batch
	/// size is 0.
	pub fn validate(&self) -> Result<()> {
		if self.window_length == 0 {
			return Err(Error::Config("window length must be at least 1".to_owned()));
		}
		if self.epochs == 0 {
			return Err(Error::Config("epochs must be at least 1".to_owned()));
		}
		if self.batch_size == 0 {
			return Err(Error::Config("batch size must be at least 1".to_owned()));
		}
		Ok(())
	}

	pub fn fit_options(&self) -> FitOptions {
		FitOptions {
			epochs: self.epochs,
			batch_size: self.batch_size,
		}
	}

	pub fn model_path(&self) -> PathBuf {
		self.model_dir.join(MODEL_FILE)
	}

	pub fn bundle_path(&self) -> PathBuf {
		self.model_dir.join(BUNDLE_FILE)
	}
}

/// Settings for one generation run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
	/// Text the initial window is cut from.
	pub seed: String,
	/// Character offset of the initial window inside `seed`.
	pub seed_offset: usize,
	/// Number of characters to generate.
	pub sample_count: usize,
	/// Sampling temperature, 0 for (near) arg-max.
	pub temperature: f32,
	/// Seed of the random source; `None` draws one from the OS.
	pub rng_seed: Option<u64>,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self {
			seed: DEFAULT_SEED.to_owned(),
			seed_offset: 0,
			sample_count: 100,
			temperature: 0.0,
			rng_seed: None,
		}
	}
}

impl GenerationConfig {
	/// # Errors
	/// Returns a configuration error if the temperature is negative or not
	/// finite.
	pub fn validate(&self) -> Result<()> {
		if !self.temperature.is_finite() || self.temperature < 0.0 {
			return Err(Error::Config(format!(
				"temperature must be a finite value >= 0, got {}",
				self.temperature
			)));
		}
		Ok(())
	}
}
