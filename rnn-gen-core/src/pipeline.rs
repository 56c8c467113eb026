use std::path::{Path, PathBuf};

use log::info;
use ndarray::{Array2, Array3};

use crate::bundle::Bundle;
use crate::config::{BUNDLE_FILE, GenerationConfig, MODEL_FILE, TrainingConfig};
use crate::dataset::examples::{EncodedExample, encode_windows};
use crate::dataset::one_hot::encode_examples;
use crate::error::{Error, Result};
use crate::io;
use crate::model::adapter::{FitOptions, FitReport, ModelAdapter};
use crate::model::frequency_model::FrequencyModel;
use crate::model::generator::{GeneratedText, generate};
use crate::text::CharacterStream;
use crate::text::normalizer::normalize_stream;
use crate::text::vocabulary::Vocabulary;

/// Everything derived from a corpus before the model sees it.
#[derive(Clone, Debug)]
pub struct TrainingData {
	pub stream: CharacterStream,
	pub vocabulary: Vocabulary,
	pub examples: Vec<EncodedExample>,
	/// `[examples, window_length, vocabulary_size]`
	pub inputs: Array3<f32>,
	/// `[examples, vocabulary_size]`
	pub targets: Array2<f32>,
	pub bundle: Bundle,
}

/// Cleans raw corpus text and turns it into training tensors.
///
/// # Errors
/// - configuration error for a window of 0
/// - input error if the cleaned corpus is empty or not longer than the window
pub fn prepare(raw: &str, window_length: usize) -> Result<TrainingData> {
	if window_length == 0 {
		return Err(Error::Config("window length must be at least 1".to_owned()));
	}

	let stream = normalize_stream(raw);
	info!("> length = {}", stream.len());
	if stream.is_empty() {
		return Err(Error::Input("corpus is empty after cleaning".to_owned()));
	}
	if stream.len() <= window_length {
		return Err(Error::Input(format!(
			"corpus has {} characters after cleaning, at least {} are needed for a window of {}",
			stream.len(),
			window_length + 1,
			window_length
		)));
	}

	let vocabulary = Vocabulary::build(&stream)?;
	info!("> unique chars = {}", vocabulary.len());

	let examples = encode_windows(&stream, window_length, &vocabulary)?;
	info!("> n examples = {}", examples.len());

	let (inputs, targets) = encode_examples(&examples, window_length, vocabulary.len())?;
	let bundle = Bundle::from_vocabulary(&vocabulary, window_length, examples.len());

	Ok(TrainingData {
		stream,
		vocabulary,
		examples,
		inputs,
		targets,
		bundle,
	})
}

/// Outcome of [`train`].
#[derive(Clone, Debug)]
pub struct TrainingReport {
	pub characters: usize,
	pub vocabulary_size: usize,
	pub fit: FitReport,
	pub model_path: PathBuf,
	pub bundle_path: PathBuf,
}

/// Reads the corpus, trains a model on it and writes the model and the
/// bundle into `config.model_dir`.
pub fn train(config: &TrainingConfig) -> Result<TrainingReport> {
	config.validate()?;

	info!("Generating training data from corpus {}", config.corpus.display());
	let raw = io::read_text(&config.corpus)?;
	let data = prepare(&raw, config.window_length)?;
	let characters = data.stream.len();

	let (trained, fit) = TrainedModel::fit(data, &config.fit_options())?;
	info!("Fitted {} examples, {} contexts known", fit.examples, fit.contexts);

	trained.save(&config.model_dir)?;
	info!("Saved model to {}", config.model_dir.display());

	Ok(TrainingReport {
		characters,
		vocabulary_size: trained.vocabulary.len(),
		fit,
		model_path: config.model_path(),
		bundle_path: config.bundle_path(),
	})
}

/// A trained model together with the bundle it must be used with.
#[derive(Clone, Debug)]
pub struct TrainedModel {
	bundle: Bundle,
	vocabulary: Vocabulary,
	model: FrequencyModel,
}

impl TrainedModel {
	/// Fits a fresh model on prepared data.
	pub fn fit(data: TrainingData, options: &FitOptions) -> Result<(Self, FitReport)> {
		let window_length = data.bundle.sequence_length();
		let mut model = FrequencyModel::new(window_length, data.vocabulary.len())?;
		let report = model.fit(data.inputs.view(), data.targets.view(), options)?;

		let trained = Self {
			bundle: data.bundle,
			vocabulary: data.vocabulary,
			model,
		};
		Ok((trained, report))
	}

	/// Loads `model.bin` and `bundle.json` from `model_dir`.
	///
	/// # Errors
	/// Returns a persistence error if a file is missing or corrupt, or if the
	/// model and the bundle disagree on the window or the vocabulary size.
	pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
		let model_dir = io::normalize_folder(model_dir);
		io::expect_folder(&model_dir)?;

		let bundle = Bundle::load(model_dir.join(BUNDLE_FILE))?;
		let vocabulary = bundle.vocabulary()?;
		let model = FrequencyModel::load(model_dir.join(MODEL_FILE))?;

		if model.window_length() != bundle.sequence_length() || model.vocabulary_size() != bundle.char_set_size() {
			return Err(Error::Persistence(format!(
				"model is [{}, {}] but bundle describes [{}, {}]",
				model.window_length(),
				model.vocabulary_size(),
				bundle.sequence_length(),
				bundle.char_set_size()
			)));
		}

		info!(
			"Loaded model from {}: window {}, {} characters",
			model_dir.display(),
			bundle.sequence_length(),
			bundle.char_set_size()
		);
		Ok(Self { bundle, vocabulary, model })
	}

	/// Writes `model.bin` and `bundle.json` into `model_dir`, creating it.
	pub fn save<P: AsRef<Path>>(&self, model_dir: P) -> Result<()> {
		let model_dir = model_dir.as_ref();
		io::ensure_folder(model_dir)?;
		self.model.save(model_dir.join(MODEL_FILE))?;
		self.bundle.save(model_dir.join(BUNDLE_FILE))?;
		Ok(())
	}

	pub fn bundle(&self) -> &Bundle {
		&self.bundle
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn model(&self) -> &FrequencyModel {
		&self.model
	}

	/// Runs the generation loop from `config`.
	pub fn generate(&self, config: &GenerationConfig) -> Result<GeneratedText> {
		generate(&self.model, &self.vocabulary, config)
	}
}
