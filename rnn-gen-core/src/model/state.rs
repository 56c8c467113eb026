use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Next-id counts observed after one context key.
///
/// A `State` is a node of the back-off model: `key` is the last `k` ids of a
/// context window and `transitions` counts which id followed it.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// Context suffix this state stands for (may be empty).
	key: Vec<usize>,
	/// Next id -> number of times it was observed after `key`.
	transitions: HashMap<usize, usize>,
}

impl State {
	/// Creates a new empty state for the given key.
	pub fn new(key: &[usize]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: HashMap::new(),
		}
	}

	pub fn key(&self) -> &[usize] {
		&self.key
	}

	/// Records one more occurrence of `next_id` after this key.
	pub fn add_transition(&mut self, next_id: usize) {
		*self.transitions.entry(next_id).or_insert(0) += 1;
	}

	/// Total number of recorded transitions.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Highest next id recorded, if any.
	pub fn max_id(&self) -> Option<usize> {
		self.transitions.keys().copied().max()
	}

	/// Writes the normalized transition counts into `probabilities`.
	///
	/// Entries for ids never observed are set to 0. Returns `false` (and
	/// leaves the slice untouched) if the state has no transitions.
	pub fn write_probabilities(&self, probabilities: &mut [f32]) -> bool {
		let total = self.total();
		if total == 0 {
			return false;
		}

		probabilities.fill(0.0);
		for (&next_id, &occurrence) in &self.transitions {
			if let Some(p) = probabilities.get_mut(next_id) {
				*p = occurrence as f32 / total as f32;
			}
		}
		true
	}

	/// Merges another state with the same key into this one, summing counts.
	///
	/// # Errors
	/// Returns an adapter error if the keys differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(Error::Adapter(format!(
				"cannot merge state {:?} into state {:?}",
				other.key, self.key
			)));
		}

		for (&next_id, &occurrence) in &other.transitions {
			*self.transitions.entry(next_id).or_insert(0) += occurrence;
		}

		Ok(())
	}
}
