use std::collections::HashMap;

use crate::error::{Error, Result};

/// Bijection between the distinct characters of a corpus and the dense ids
/// `0..len()`.
///
/// # Invariants
/// - `id_to_char[char_to_id[c]] == c` for every known character
/// - `char_to_id.len() == id_to_char.len()`
/// - never empty
///
/// A vocabulary is built once at training time and then persisted through a
/// [`Bundle`](crate::bundle::Bundle). Rebuilding it from another corpus
/// sample would give ids that no longer match the trained model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
	id_to_char: Vec<char>,
	char_to_id: HashMap<char, usize>,
}

impl Vocabulary {
	/// Builds a vocabulary from a character stream.
	///
	/// Ids are given in first-occurrence order.
	///
	/// # Errors
	/// Returns an input error if the stream is empty.
	pub fn build(stream: &[char]) -> Result<Self> {
		if stream.is_empty() {
			return Err(Error::Input("cannot build a vocabulary from an empty stream".to_owned()));
		}

		let mut id_to_char = Vec::new();
		let mut char_to_id = HashMap::new();
		for &c in stream {
			char_to_id.entry(c).or_insert_with(|| {
				id_to_char.push(c);
				id_to_char.len() - 1
			});
		}

		Ok(Self { id_to_char, char_to_id })
	}

	/// Rebuilds a vocabulary from an ordered list of characters, where the
	/// position of each character is its id.
	///
	/// # Errors
	/// Returns a persistence error if the list is empty or has duplicates.
	pub fn from_ordered(id_to_char: Vec<char>) -> Result<Self> {
		if id_to_char.is_empty() {
			return Err(Error::Persistence("vocabulary is empty".to_owned()));
		}

		let mut char_to_id = HashMap::with_capacity(id_to_char.len());
		for (id, &c) in id_to_char.iter().enumerate() {
			if let Some(previous) = char_to_id.insert(c, id) {
				return Err(Error::Persistence(format!(
					"character {c:?} is mapped to both id {previous} and id {id}"
				)));
			}
		}

		Ok(Self { id_to_char, char_to_id })
	}

	/// Number of distinct characters.
	pub fn len(&self) -> usize {
		self.id_to_char.len()
	}

	/// Always false for a constructed vocabulary, kept for API symmetry.
	pub fn is_empty(&self) -> bool {
		self.id_to_char.is_empty()
	}

	pub fn id_of(&self, c: char) -> Option<usize> {
		self.char_to_id.get(&c).copied()
	}

	pub fn char_of(&self, id: usize) -> Option<char> {
		self.id_to_char.get(id).copied()
	}

	/// Characters in id order.
	pub fn chars(&self) -> &[char] {
		&self.id_to_char
	}

	/// Maps characters to ids.
	///
	/// # Errors
	/// Returns an input error naming the first character that is not part
	/// of the vocabulary.
	pub fn encode(&self, chars: &[char]) -> Result<Vec<usize>> {
		chars
			.iter()
			.enumerate()
			.map(|(position, &c)| {
				self.id_of(c).ok_or_else(|| {
					Error::Input(format!("character {c:?} at position {position} is not in the vocabulary"))
				})
			})
			.collect()
	}

	/// Maps ids back to a string.
	///
	/// # Errors
	/// Returns an encoding error on the first id outside the vocabulary.
	pub fn decode(&self, ids: &[usize]) -> Result<String> {
		ids.iter()
			.enumerate()
			.map(|(position, &id)| {
				self.char_of(id).ok_or(Error::Encoding {
					position,
					id,
					vocabulary_size: self.len(),
				})
			})
			.collect()
	}
}
