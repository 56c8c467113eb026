//! Character-level text generation library.
//!
//! This crate provides the framework-free parts of a next-character model:
//! - Corpus cleaning and character vocabularies
//! - Sliding-window training examples and their one-hot tensors
//! - Temperature sampling over probability vectors
//! - A seeded, sliding-window generation loop
//! - Bundle persistence (vocabulary + metadata as JSON)
//!
//! The model itself sits behind the [`model::adapter::ModelAdapter`] trait;
//! [`model::frequency_model::FrequencyModel`] is the implementation shipped
//! with the crate.

/// Text cleaning, character streams and vocabularies.
pub mod text;

/// Windowed examples and one-hot encoding.
pub mod dataset;

/// Model adapter, sampling and generation logic.
pub mod model;

/// Vocabulary + metadata persisted next to a trained model.
pub mod bundle;

/// Training and generation settings.
pub mod config;

/// Error type shared by the whole crate.
pub mod error;

/// End-to-end training and loading.
pub mod pipeline;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::{Error, Result};
