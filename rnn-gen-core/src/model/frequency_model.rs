use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::debug;
use ndarray::{Array2, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

use super::adapter::{FitOptions, FitReport, ModelAdapter};
use super::state::State;
use crate::dataset::one_hot::{decode_sequence, decode_targets};
use crate::error::{Error, Result};

/// Back-off next-character model built from transition counts.
///
/// For every suffix length `k` in `0..=window_length` the model keeps a table
/// of [`State`]s keyed by the last `k` ids of a context. Prediction starts
/// from the full window and falls back to shorter suffixes until one was
/// seen during training; the empty suffix (plain character frequencies) is
/// always known once the model has been fitted.
///
/// # Invariants
/// - `orders.len() == window_length + 1`
/// - every key in `orders[k]` has length `k`
/// - every recorded id is `< vocabulary_size`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FrequencyModel {
	window_length: usize,
	vocabulary_size: usize,
	orders: Vec<HashMap<Vec<usize>, State>>,
	examples_seen: usize,
}

impl FrequencyModel {
	/// Creates an empty model.
	///
	/// # Errors
	/// Returns a configuration error if either dimension is 0.
	pub fn new(window_length: usize, vocabulary_size: usize) -> Result<Self> {
		if window_length == 0 || vocabulary_size == 0 {
			return Err(Error::Config(format!(
				"model dimensions must be positive, got window {window_length} and vocabulary {vocabulary_size}"
			)));
		}
		Ok(Self {
			window_length,
			vocabulary_size,
			orders: vec![HashMap::new(); window_length + 1],
			examples_seen: 0,
		})
	}

	/// Number of examples counted so far.
	pub fn examples_seen(&self) -> usize {
		self.examples_seen
	}

	/// Number of distinct context suffixes known, all orders included.
	pub fn context_count(&self) -> usize {
		self.orders.iter().map(HashMap::len).sum()
	}

	/// Records one example: every suffix of `context` was followed by `target`.
	fn add_example(&mut self, context: &[usize], target: usize) {
		for (k, states) in self.orders.iter_mut().enumerate() {
			let key = &context[context.len() - k..];
			states
				.entry(key.to_vec())
				.or_insert_with(|| State::new(key))
				.add_transition(target);
		}
		self.examples_seen += 1;
	}

	/// Fills `probabilities` from the longest known suffix of `context`.
	fn write_distribution(&self, context: &[usize], probabilities: &mut [f32]) -> bool {
		(0..=self.window_length).rev().any(|k| {
			self.orders[k]
				.get(&context[context.len() - k..])
				.is_some_and(|state| state.write_probabilities(probabilities))
		})
	}

	/// Merges another model with the same dimensions into this one.
	///
	/// # Errors
	/// Returns an adapter error if the dimensions differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.window_length != other.window_length || self.vocabulary_size != other.vocabulary_size {
			return Err(Error::Adapter(format!(
				"cannot merge a [{}, {}] model into a [{}, {}] model",
				other.window_length, other.vocabulary_size, self.window_length, self.vocabulary_size
			)));
		}

		for (states, other_states) in self.orders.iter_mut().zip(&other.orders) {
			for (key, state) in other_states {
				if let Some(existing) = states.get_mut(key) {
					existing.merge(state)?;
				} else {
					states.insert(key.clone(), state.clone());
				}
			}
		}
		self.examples_seen += other.examples_seen;

		Ok(())
	}

	/// Counts the examples on worker threads and merges the partial models.
	///
	/// Examples are split in batches of `batch_size`, and the batches are
	/// spread over at most one worker per CPU.
	fn count_parallel(&mut self, examples: Vec<(Vec<usize>, usize)>, batch_size: usize) -> Result<()> {
		if examples.is_empty() {
			return Ok(());
		}

		let batches = examples.len().div_ceil(batch_size);
		let workers = num_cpus::get().clamp(1, batches);
		let chunk_size = batches.div_ceil(workers) * batch_size;
		debug!(
			"counting {} examples in {} batches over {} workers",
			examples.len(),
			batches,
			workers
		);

		let expected = examples.len();
		let (tx, rx) = mpsc::channel();
		for chunk in examples.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk = chunk.to_vec();
			let mut partial_model = Self::new(self.window_length, self.vocabulary_size)?;

			thread::spawn(move || {
				for (context, target) in &chunk {
					partial_model.add_example(context, *target);
				}
				// The receiver outlives every worker
				let _ = tx.send(partial_model);
			});
		}
		drop(tx);

		let mut counted = Self::new(self.window_length, self.vocabulary_size)?;
		for partial_model in rx.iter() {
			counted.merge(&partial_model)?;
		}
		if counted.examples_seen != expected {
			return Err(Error::Adapter(format!(
				"a counting worker failed: {} of {} examples counted",
				counted.examples_seen, expected
			)));
		}

		self.merge(&counted)
	}

	fn check_input_shape(&self, input: &ArrayView3<f32>) -> Result<()> {
		let (_, window_length, vocabulary_size) = input.dim();
		if window_length != self.window_length || vocabulary_size != self.vocabulary_size {
			return Err(Error::Adapter(format!(
				"expected input of shape [_, {}, {}], got {:?}",
				self.window_length,
				self.vocabulary_size,
				input.shape()
			)));
		}
		Ok(())
	}

	/// Writes the model to `path` as postcard bytes.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Reads a model written by [`save`](Self::save).
	///
	/// # Errors
	/// Returns a persistence error if the file is missing, unreadable, or
	/// does not hold a consistent model.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path)
			.map_err(|e| Error::Persistence(format!("cannot read model file {}: {e}", path.display())))?;
		let model: Self = postcard::from_bytes(&bytes)
			.map_err(|e| Error::Persistence(format!("corrupt model file {}: {e}", path.display())))?;
		model.validate()?;
		Ok(model)
	}

	fn validate(&self) -> Result<()> {
		if self.window_length == 0 || self.vocabulary_size == 0 || self.orders.len() != self.window_length + 1 {
			return Err(Error::Persistence("model dimensions are inconsistent".to_owned()));
		}
		for (k, states) in self.orders.iter().enumerate() {
			for (key, state) in states {
				let ids_in_range = key.iter().all(|&id| id < self.vocabulary_size)
					&& state.max_id().is_none_or(|id| id < self.vocabulary_size);
				if key.len() != k || state.key() != key.as_slice() || !ids_in_range {
					return Err(Error::Persistence(format!("model state {key:?} is inconsistent")));
				}
			}
		}
		Ok(())
	}
}

impl ModelAdapter for FrequencyModel {
	fn window_length(&self) -> usize {
		self.window_length
	}

	fn vocabulary_size(&self) -> usize {
		self.vocabulary_size
	}

	fn predict(&self, input: ArrayView3<f32>) -> Result<Array2<f32>> {
		self.check_input_shape(&input)?;
		if self.examples_seen == 0 {
			return Err(Error::Adapter("the model has not been fitted".to_owned()));
		}

		let contexts = decode_sequence(input).map_err(|e| Error::Adapter(e.to_string()))?;
		let mut output = Array2::zeros((contexts.len(), self.vocabulary_size));
		for (mut row, context) in output.outer_iter_mut().zip(&contexts) {
			let mut probabilities = vec![0.0; self.vocabulary_size];
			if !self.write_distribution(context, &mut probabilities) {
				return Err(Error::Adapter(format!("no distribution known for context {context:?}")));
			}
			row.assign(&ndarray::aview1(&probabilities));
		}

		Ok(output)
	}

	fn fit(&mut self, inputs: ArrayView3<f32>, targets: ArrayView2<f32>, options: &FitOptions) -> Result<FitReport> {
		self.check_input_shape(&inputs)?;
		if targets.dim() != (inputs.dim().0, self.vocabulary_size) {
			return Err(Error::Adapter(format!(
				"targets of shape {:?} do not match inputs of shape {:?}",
				targets.shape(),
				inputs.shape()
			)));
		}
		if options.epochs == 0 || options.batch_size == 0 {
			return Err(Error::Config("epochs and batch size must be positive".to_owned()));
		}

		let contexts = decode_sequence(inputs).map_err(|e| Error::Adapter(e.to_string()))?;
		let next_ids = decode_targets(targets).map_err(|e| Error::Adapter(e.to_string()))?;
		let examples: Vec<(Vec<usize>, usize)> = contexts.into_iter().zip(next_ids).collect();
		let count = examples.len();

		self.count_parallel(examples, options.batch_size)?;
		if options.epochs > 1 {
			debug!("counts are exact after one pass, skipping {} more epochs", options.epochs - 1);
		}

		Ok(FitReport {
			examples: count,
			epochs: 1,
			contexts: self.context_count(),
		})
	}
}
