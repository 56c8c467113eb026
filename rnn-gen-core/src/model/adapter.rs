use ndarray::{Array2, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Training knobs handed to [`ModelAdapter::fit`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitOptions {
	pub epochs: usize,
	pub batch_size: usize,
}

/// What a call to [`ModelAdapter::fit`] did.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitReport {
	/// Examples consumed per epoch.
	pub examples: usize,
	/// Epochs actually run.
	pub epochs: usize,
	/// Distinct contexts the model knows after fitting.
	pub contexts: usize,
}

/// The model behind next-character prediction.
///
/// The pipeline only relies on the call/return shapes:
/// - `predict` takes `[batch, window_length, vocabulary_size]` one-hot input
///   and returns `[batch, vocabulary_size]` probability rows
/// - `fit` takes the same input tensor plus `[batch, vocabulary_size]`
///   one-hot targets
///
/// Failures are returned as they are; callers never retry.
pub trait ModelAdapter {
	fn window_length(&self) -> usize;

	fn vocabulary_size(&self) -> usize;

	/// Returns one probability distribution per batch row.
	fn predict(&self, input: ArrayView3<f32>) -> Result<Array2<f32>>;

	/// Trains the model on one-hot inputs and targets.
	fn fit(&mut self, inputs: ArrayView3<f32>, targets: ArrayView2<f32>, options: &FitOptions) -> Result<FitReport>;
}
