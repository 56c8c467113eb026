//! Text side of the pipeline: cleaning raw corpus text and mapping
//! characters to dense ids.

/// Corpus cleaning (lowercase, punctuation, line breaks, whitespace runs).
pub mod normalizer;

/// Character vocabulary (`char` <-> dense id bijection).
pub mod vocabulary;

use std::ops::Deref;

/// An ordered, immutable sequence of characters taken from cleaned text.
///
/// Indexing is by character, never by byte, so multibyte characters are
/// one position each.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterStream {
	chars: Vec<char>,
}

impl CharacterStream {
	pub fn new(text: &str) -> Self {
		Self { chars: text.chars().collect() }
	}

	pub fn as_slice(&self) -> &[char] {
		&self.chars
	}
}

impl Deref for CharacterStream {
	type Target = [char];

	fn deref(&self) -> &[char] {
		&self.chars
	}
}

impl From<&str> for CharacterStream {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}

impl std::fmt::Display for CharacterStream {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for c in &self.chars {
			write!(f, "{c}")?;
		}
		Ok(())
	}
}
