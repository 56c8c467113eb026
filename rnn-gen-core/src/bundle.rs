use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text::vocabulary::Vocabulary;

/// Vocabulary and configuration metadata saved next to a trained model.
///
/// The JSON layout is:
///
/// ```json
/// {
///   "numExamples": 33,
///   "charSetSize": 13,
///   "sequenceLength": 10,
///   "charToId": { "f": 0, "o": 1 },
///   "idToChar": { "0": "f", "1": "o" }
/// }
/// ```
///
/// Encoding at inference time must use the exact maps the model was trained
/// with, so a bundle is only ever built from the training vocabulary and
/// read back unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
	num_examples: usize,
	char_set_size: usize,
	sequence_length: usize,
	char_to_id: BTreeMap<char, usize>,
	id_to_char: BTreeMap<usize, char>,
}

impl Bundle {
	pub fn from_vocabulary(vocabulary: &Vocabulary, sequence_length: usize, num_examples: usize) -> Self {
		let id_to_char: BTreeMap<usize, char> = vocabulary.chars().iter().copied().enumerate().collect();
		let char_to_id = id_to_char.iter().map(|(&id, &c)| (c, id)).collect();

		Self {
			num_examples,
			char_set_size: vocabulary.len(),
			sequence_length,
			char_to_id,
			id_to_char,
		}
	}

	pub fn num_examples(&self) -> usize {
		self.num_examples
	}

	pub fn char_set_size(&self) -> usize {
		self.char_set_size
	}

	pub fn sequence_length(&self) -> usize {
		self.sequence_length
	}

	pub fn char_to_id(&self) -> &BTreeMap<char, usize> {
		&self.char_to_id
	}

	pub fn id_to_char(&self) -> &BTreeMap<usize, char> {
		&self.id_to_char
	}

	/// Rebuilds the vocabulary the bundle was created from.
	///
	/// # Errors
	/// Returns a persistence error if the maps are not exact inverses over
	/// the dense id range `0..charSetSize`.
	pub fn vocabulary(&self) -> Result<Vocabulary> {
		if self.id_to_char.len() != self.char_set_size || self.char_to_id.len() != self.char_set_size {
			return Err(Error::Persistence(format!(
				"charSetSize is {} but the bundle maps hold {} and {} entries",
				self.char_set_size,
				self.char_to_id.len(),
				self.id_to_char.len()
			)));
		}

		let mut ordered = Vec::with_capacity(self.char_set_size);
		for (expected_id, (&id, &c)) in self.id_to_char.iter().enumerate() {
			if id != expected_id {
				return Err(Error::Persistence(format!("idToChar is missing id {expected_id}")));
			}
			if self.char_to_id.get(&c) != Some(&id) {
				return Err(Error::Persistence(format!("charToId and idToChar disagree on {c:?}")));
			}
			ordered.push(c);
		}

		Vocabulary::from_ordered(ordered)
	}

	/// Writes the bundle as JSON.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let json = serde_json::to_string_pretty(self)?;
		std::fs::write(path, json)?;
		Ok(())
	}

	/// Reads and checks a bundle written by [`save`](Self::save).
	///
	/// # Errors
	/// Returns a persistence error if the file is missing, is not a valid
	/// bundle document, or has inconsistent maps or sizes.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path)
			.map_err(|e| Error::Persistence(format!("cannot read bundle {}: {e}", path.display())))?;
		let bundle: Self = serde_json::from_str(&json)
			.map_err(|e| Error::Persistence(format!("corrupt bundle {}: {e}", path.display())))?;

		if bundle.sequence_length == 0 {
			return Err(Error::Persistence("sequenceLength must be positive".to_owned()));
		}
		bundle.vocabulary()?;

		Ok(bundle)
	}
}
