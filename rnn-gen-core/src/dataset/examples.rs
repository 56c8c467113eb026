use crate::error::Result;
use crate::text::vocabulary::Vocabulary;

/// A context window and the character that follows it in the stream.
///
/// Borrows its context from the stream it was cut from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Example<'a> {
	pub context: &'a [char],
	pub target: char,
}

/// An [`Example`] with its characters replaced by vocabulary ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedExample {
	pub context: Vec<usize>,
	pub target: usize,
}

impl Example<'_> {
	/// Encodes the context and the target.
	///
	/// # Errors
	/// Returns an input error if a character is not in the vocabulary.
	pub fn encode(&self, vocabulary: &Vocabulary) -> Result<EncodedExample> {
		let context = vocabulary.encode(self.context)?;
		let target = vocabulary.encode(&[self.target])?[0];
		Ok(EncodedExample { context, target })
	}
}

/// Number of examples a stream of `stream_len` characters yields with a
/// window of `window_length`: `max(0, stream_len - window_length)`.
pub fn example_count(stream_len: usize, window_length: usize) -> usize {
	stream_len.saturating_sub(window_length)
}

/// Slides a window of `window_length` characters over the stream.
///
/// For each offset `i` in `0..stream.len() - window_length` the example is
/// `(stream[i..i + window_length], stream[i + window_length])`, in
/// increasing offset order. Overlapping windows are all kept.
///
/// A stream not longer than the window yields nothing.
pub fn windows(stream: &[char], window_length: usize) -> impl Iterator<Item = Example<'_>> {
	(0..example_count(stream.len(), window_length)).map(move |i| Example {
		context: &stream[i..i + window_length],
		target: stream[i + window_length],
	})
}

/// Generates every example of the stream and encodes it.
///
/// # Errors
/// Returns an input error if the stream holds a character missing from
/// the vocabulary.
pub fn encode_windows(
	stream: &[char],
	window_length: usize,
	vocabulary: &Vocabulary,
) -> Result<Vec<EncodedExample>> {
	windows(stream, window_length).map(|example| example.encode(vocabulary)).collect()
}
