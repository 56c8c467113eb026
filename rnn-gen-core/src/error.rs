use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the pipeline can surface.
///
/// There is no degraded mode: each stage needs the full output of the
/// previous one, so all of these are fatal to the current run.
#[derive(Debug, Error)]
pub enum Error {
	/// Bad user input: empty corpus, short corpus or seed, unknown seed character.
	#[error("input error: {0}")]
	Input(String),

	/// An id outside the vocabulary reached the one-hot encoder.
	#[error("encoding error: id {id} at position {position} is outside a vocabulary of size {vocabulary_size}")]
	Encoding {
		position: usize,
		id: usize,
		vocabulary_size: usize,
	},

	/// A tensor or context did not have the expected shape.
	#[error("encoding error: {0}")]
	EncodingShape(String),

	/// Bundle or model file is missing, corrupt or inconsistent.
	#[error("persistence error: {0}")]
	Persistence(String),

	#[error("persistence error: {0}")]
	Io(#[from] std::io::Error),

	#[error("persistence error: invalid bundle JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("persistence error: invalid model file: {0}")]
	Postcard(#[from] postcard::Error),

	/// The model adapter failed (shape mismatch, untrained model, backend failure).
	#[error("adapter error: {0}")]
	Adapter(String),

	/// The sampler received a vector it cannot draw from.
	#[error("distribution error: {0}")]
	Distribution(String),

	#[error("configuration error: {0}")]
	Config(String),
}

impl Error {
	/// Whether the failure comes from caller input rather than from
	/// the trained artifacts or the model.
	pub fn is_input(&self) -> bool {
		matches!(self, Error::Input(_) | Error::Config(_))
	}
}
