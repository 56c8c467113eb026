use std::collections::VecDeque;

use log::debug;
use rand::Rng;
use rand::rngs::StdRng;

use super::adapter::ModelAdapter;
use super::sampler::TemperatureSampler;
use crate::config::GenerationConfig;
use crate::dataset::one_hot::encode_sequence;
use crate::error::{Error, Result};
use crate::text::vocabulary::Vocabulary;

/// Where a [`Generation`] currently is.
///
/// `Seeded -> Sampling -> Appended -> Sampling -> ... -> Done`
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationState {
	/// Initial window set, nothing generated yet.
	Seeded,
	/// The model answered; holds the distribution for the next character.
	Sampling(Vec<f32>),
	/// A character was drawn, appended, and the window moved by one.
	Appended(char),
	/// The requested number of characters was generated.
	Done,
}

/// Text produced by a [`Generation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedText {
	/// Initial window.
	pub seed: String,
	/// Characters generated after the seed.
	pub text: String,
}

impl std::fmt::Display for GeneratedText {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, ">{}\n{}", self.seed, self.text)
	}
}

/// Sliding-window text generation driven by a model and a sampler.
///
/// Each round encodes the current window, asks the model for a
/// distribution, samples one character, appends it, and drops the oldest
/// character of the window.
///
/// Any error (from the model in particular) ends the generation: there is
/// no retry and no partial result. The state is `Done` afterwards.
pub struct Generation<'a, M: ModelAdapter + ?Sized, R: Rng = StdRng> {
	model: &'a M,
	vocabulary: &'a Vocabulary,
	sampler: TemperatureSampler<R>,
	temperature: f32,
	seed: String,
	window: VecDeque<usize>,
	remaining: usize,
	generated: String,
	state: GenerationState,
}

impl<'a, M: ModelAdapter + ?Sized, R: Rng> Generation<'a, M, R> {
	/// Sets up a generation from `config`.
	///
	/// The initial window is the `model.window_length()` characters of
	/// `config.seed` starting at `config.seed_offset`.
	///
	/// # Errors
	/// - configuration error for an invalid temperature
	/// - adapter error if the model and vocabulary sizes differ
	/// - input error if the seed is too short or holds unknown characters
	pub fn new(
		model: &'a M,
		vocabulary: &'a Vocabulary,
		config: &GenerationConfig,
		sampler: TemperatureSampler<R>,
	) -> Result<Self> {
		config.validate()?;
		if model.vocabulary_size() != vocabulary.len() {
			return Err(Error::Adapter(format!(
				"model expects {} characters, vocabulary has {}",
				model.vocabulary_size(),
				vocabulary.len()
			)));
		}

		let window_length = model.window_length();
		let seed: Vec<char> = config.seed.chars().skip(config.seed_offset).take(window_length).collect();
		if seed.len() < window_length {
			return Err(Error::Input(format!(
				"seed must hold at least {} characters after offset {}, got {}",
				window_length,
				config.seed_offset,
				seed.len()
			)));
		}
		let window = vocabulary.encode(&seed)?.into();

		Ok(Self {
			model,
			vocabulary,
			sampler,
			temperature: config.temperature,
			seed: seed.into_iter().collect(),
			window,
			remaining: config.sample_count,
			generated: String::new(),
			state: GenerationState::Seeded,
		})
	}

	pub fn state(&self) -> &GenerationState {
		&self.state
	}

	/// Characters generated so far.
	pub fn generated(&self) -> &str {
		&self.generated
	}

	/// Performs one transition and returns the new state.
	pub fn step(&mut self) -> Result<&GenerationState> {
		let state = std::mem::replace(&mut self.state, GenerationState::Done);
		self.state = match state {
			GenerationState::Seeded | GenerationState::Appended(_) if self.remaining == 0 => GenerationState::Done,
			GenerationState::Seeded | GenerationState::Appended(_) => GenerationState::Sampling(self.predict()?),
			GenerationState::Sampling(probabilities) => GenerationState::Appended(self.append(&probabilities)?),
			GenerationState::Done => GenerationState::Done,
		};
		Ok(&self.state)
	}

	/// Runs until `Done` and returns the seed and the generated text.
	pub fn run(mut self) -> Result<GeneratedText> {
		while self.step()? != &GenerationState::Done {}
		debug!("generated {} characters", self.generated.chars().count());

		Ok(GeneratedText {
			seed: self.seed,
			text: self.generated,
		})
	}

	/// Encodes the window and asks the model for the next distribution.
	fn predict(&self) -> Result<Vec<f32>> {
		let ids: Vec<usize> = self.window.iter().copied().collect();
		let input = encode_sequence(&ids, self.vocabulary.len())?;
		let output = self.model.predict(input.view())?;

		if output.dim() != (1, self.vocabulary.len()) {
			return Err(Error::Adapter(format!(
				"expected a prediction of shape [1, {}], got {:?}",
				self.vocabulary.len(),
				output.shape()
			)));
		}
		Ok(output.row(0).to_vec())
	}

	/// Draws the next character, appends it, and slides the window.
	fn append(&mut self, probabilities: &[f32]) -> Result<char> {
		let id = self.sampler.sample(probabilities, self.temperature)?;
		let c = self.vocabulary.char_of(id).ok_or(Error::Encoding {
			position: self.generated.chars().count(),
			id,
			vocabulary_size: self.vocabulary.len(),
		})?;

		self.generated.push(c);
		self.window.pop_front();
		self.window.push_back(id);
		self.remaining -= 1;
		Ok(c)
	}
}

/// Generates text with a sampler seeded from `config.rng_seed`.
pub fn generate<M: ModelAdapter + ?Sized>(
	model: &M,
	vocabulary: &Vocabulary,
	config: &GenerationConfig,
) -> Result<GeneratedText> {
	let sampler = TemperatureSampler::with_seed(config.rng_seed);
	Generation::new(model, vocabulary, config, sampler)?.run()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::adapter::{FitOptions, FitReport};
	use ndarray::{Array2, ArrayView2, ArrayView3};
	use std::cell::Cell;

	/// Always predicts the id following the last one in the window.
	struct Cycle {
		window_length: usize,
		vocabulary_size: usize,
		calls: Cell<usize>,
	}

	impl Cycle {
		fn new(window_length: usize, vocabulary_size: usize) -> Self {
			Self { window_length, vocabulary_size, calls: Cell::new(0) }
		}
	}

	impl ModelAdapter for Cycle {
		fn window_length(&self) -> usize {
			self.window_length
		}

		fn vocabulary_size(&self) -> usize {
			self.vocabulary_size
		}

		fn predict(&self, input: ArrayView3<f32>) -> Result<Array2<f32>> {
			self.calls.set(self.calls.get() + 1);
			assert_eq!(input.shape(), &[1, self.window_length, self.vocabulary_size]);
			let last = input.slice(ndarray::s![0, self.window_length - 1, ..]);
			let id = last.iter().position(|&v| v == 1.0).unwrap();
			let mut output = Array2::zeros((1, self.vocabulary_size));
			output[[0, (id + 1) % self.vocabulary_size]] = 1.0;
			Ok(output)
		}

		fn fit(&mut self, _: ArrayView3<f32>, _: ArrayView2<f32>, _: &FitOptions) -> Result<FitReport> {
			unimplemented!()
		}
	}

	/// Fails on the given call.
	struct Broken {
		inner: Cycle,
		fail_on: usize,
	}

	impl ModelAdapter for Broken {
		fn window_length(&self) -> usize {
			self.inner.window_length
		}

		fn vocabulary_size(&self) -> usize {
			self.inner.vocabulary_size
		}

		fn predict(&self, input: ArrayView3<f32>) -> Result<Array2<f32>> {
			if self.inner.calls.get() + 1 == self.fail_on {
				return Err(Error::Adapter("backend went away".to_owned()));
			}
			self.inner.predict(input)
		}

		fn fit(&mut self, _: ArrayView3<f32>, _: ArrayView2<f32>, _: &FitOptions) -> Result<FitReport> {
			unimplemented!()
		}
	}

	fn abcd() -> Vocabulary {
		Vocabulary::build(&['a', 'b', 'c', 'd']).unwrap()
	}

	fn config(seed: &str, sample_count: usize) -> GenerationConfig {
		GenerationConfig {
			seed: seed.to_owned(),
			sample_count,
			rng_seed: Some(1),
			..GenerationConfig::default()
		}
	}

	#[test]
	fn follows_the_state_machine() {
		let model = Cycle::new(2, 4);
		let vocabulary = abcd();
		let mut generation =
			Generation::new(&model, &vocabulary, &config("ab", 2), TemperatureSampler::seeded(0)).unwrap();

		assert_eq!(generation.state(), &GenerationState::Seeded);
		assert!(matches!(generation.step().unwrap(), GenerationState::Sampling(_)));
		assert_eq!(generation.step().unwrap(), &GenerationState::Appended('c'));
		assert!(matches!(generation.step().unwrap(), GenerationState::Sampling(_)));
		assert_eq!(generation.step().unwrap(), &GenerationState::Appended('d'));
		assert_eq!(generation.step().unwrap(), &GenerationState::Done);
		assert_eq!(generation.step().unwrap(), &GenerationState::Done);
		assert_eq!(generation.generated(), "cd");
		assert_eq!(model.calls.get(), 2);
	}

	#[test]
	fn window_slides_over_generated_text() {
		let model = Cycle::new(3, 4);
		let vocabulary = abcd();
		let generated = generate(&model, &vocabulary, &config("abc", 6)).unwrap();
		assert_eq!(generated.seed, "abc");
		assert_eq!(generated.text, "dabcda");
		assert_eq!(generated.to_string(), ">abc\ndabcda");
	}

	#[test]
	fn seed_offset_selects_the_window() {
		let model = Cycle::new(2, 4);
		let vocabulary = abcd();
		let config = GenerationConfig { seed_offset: 2, ..config("abdabc", 1) };
		let generated = generate(&model, &vocabulary, &config).unwrap();
		assert_eq!(generated.seed, "da");
		assert_eq!(generated.text, "b");
	}

	#[test]
	fn zero_samples_finish_immediately() {
		let model = Cycle::new(2, 4);
		let vocabulary = abcd();
		let generated = generate(&model, &vocabulary, &config("ab", 0)).unwrap();
		assert_eq!(generated.text, "");
		assert_eq!(model.calls.get(), 0);
	}

	#[test]
	fn short_seeds_are_rejected() {
		let model = Cycle::new(3, 4);
		let vocabulary = abcd();
		assert!(matches!(generate(&model, &vocabulary, &config("ab", 1)), Err(Error::Input(_))));
		let offset = GenerationConfig { seed_offset: 2, ..config("abcd", 1) };
		assert!(matches!(generate(&model, &vocabulary, &offset), Err(Error::Input(_))));
	}

	#[test]
	fn unknown_seed_characters_are_rejected() {
		let model = Cycle::new(2, 4);
		let vocabulary = abcd();
		assert!(matches!(generate(&model, &vocabulary, &config("az", 1)), Err(Error::Input(_))));
	}

	#[test]
	fn vocabulary_must_match_the_model() {
		let model = Cycle::new(2, 5);
		let vocabulary = abcd();
		assert!(matches!(generate(&model, &vocabulary, &config("ab", 1)), Err(Error::Adapter(_))));
	}

	#[test]
	fn adapter_failures_abort_the_loop() {
		let model = Broken { inner: Cycle::new(2, 4), fail_on: 3 };
		let vocabulary = abcd();
		let err = generate(&model, &vocabulary, &config("ab", 10)).unwrap_err();
		assert!(matches!(err, Error::Adapter(ref m) if m == "backend went away"));
		assert_eq!(model.inner.calls.get(), 2);
	}
}
