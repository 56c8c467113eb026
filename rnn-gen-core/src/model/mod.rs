//! Model side of the pipeline.
//!
//! This module provides:
//! - The model interface (`ModelAdapter`)
//! - A back-off frequency model implementing it (`FrequencyModel`)
//! - Internal count storage (`State`)
//! - Temperature sampling (`TemperatureSampler`)
//! - The generation loop (`Generation`)

/// Call/return contract of a next-character model.
pub mod adapter;

/// Back-off next-character model built from transition counts.
///
/// Supports parallel fitting, merging, and postcard persistence.
pub mod frequency_model;

/// Sliding-window generation state machine.
pub mod generator;

/// Temperature-scaled categorical sampling.
pub mod sampler;

/// Transition counts for one context key.
/// This module is not exposed publicly.
mod state;
