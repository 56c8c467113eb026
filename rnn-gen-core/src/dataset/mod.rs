//! Training data: windowed examples and their one-hot tensors.

/// Sliding-window (context, next character) examples.
pub mod examples;

/// One-hot tensor encoding and argmax decoding.
pub mod one_hot;
