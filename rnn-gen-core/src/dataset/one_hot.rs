use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, ArrayViewMut2, Axis};

use super::examples::EncodedExample;
use crate::error::{Error, Result};
use crate::model::sampler::argmax;
use crate::text::vocabulary::Vocabulary;

/// Writes a one-hot vector for `id` into `row`.
///
/// The whole row is overwritten, so the caller does not need to hand over
/// zeroed storage.
///
/// # Errors
/// Returns an encoding error if `id` is not smaller than the row length.
pub fn write_one_hot(mut row: ArrayViewMut1<f32>, id: usize, position: usize) -> Result<()> {
	let vocabulary_size = row.len();
	if id >= vocabulary_size {
		return Err(Error::Encoding { position, id, vocabulary_size });
	}
	row.fill(0.0);
	row[id] = 1.0;
	Ok(())
}

/// One-hot encodes `ids` into a `[ids.len(), vocabulary_size]` view.
///
/// `first_position` is added to the index reported in errors.
fn write_sequence(mut target: ArrayViewMut2<f32>, ids: &[usize], first_position: usize) -> Result<()> {
	if target.nrows() != ids.len() {
		return Err(Error::EncodingShape(format!(
			"expected {} ids, got {}",
			target.nrows(),
			ids.len()
		)));
	}
	for (i, (row, &id)) in target.outer_iter_mut().zip(ids).enumerate() {
		write_one_hot(row, id, first_position + i)?;
	}
	Ok(())
}

fn check_vocabulary_size(vocabulary_size: usize) -> Result<()> {
	if vocabulary_size == 0 {
		return Err(Error::EncodingShape("vocabulary size must be at least 1".to_owned()));
	}
	Ok(())
}

/// Builds the training tensors for a batch of examples.
///
/// Returns `(inputs, targets)`:
/// - `inputs` has shape `[examples.len(), window_length, vocabulary_size]`
/// - `targets` has shape `[examples.len(), vocabulary_size]`
///
/// Positions in errors are stream offsets, assuming the examples were cut
/// at consecutive offsets (as [`windows`](super::examples::windows) does).
///
/// # Errors
/// - an id outside `0..vocabulary_size`
/// - a context that is not `window_length` long
/// - a vocabulary size of 0
pub fn encode_examples(
	examples: &[EncodedExample],
	window_length: usize,
	vocabulary_size: usize,
) -> Result<(Array3<f32>, Array2<f32>)> {
	check_vocabulary_size(vocabulary_size)?;

	let mut inputs = Array3::zeros((examples.len(), window_length, vocabulary_size));
	let mut targets = Array2::zeros((examples.len(), vocabulary_size));

	for (n, example) in examples.iter().enumerate() {
		if example.context.len() != window_length {
			return Err(Error::EncodingShape(format!(
				"example {n} has a context of {} ids, expected {window_length}",
				example.context.len()
			)));
		}
		write_sequence(inputs.index_axis_mut(Axis(0), n), &example.context, n)?;
		write_one_hot(targets.row_mut(n), example.target, n + window_length)?;
	}

	Ok((inputs, targets))
}

/// Encodes a single id sequence as a `[1, ids.len(), vocabulary_size]`
/// tensor, the shape the model expects at inference time.
///
/// # Errors
/// Returns an encoding error for an id outside `0..vocabulary_size` or a
/// vocabulary size of 0.
pub fn encode_sequence(ids: &[usize], vocabulary_size: usize) -> Result<Array3<f32>> {
	check_vocabulary_size(vocabulary_size)?;
	let mut tensor = Array3::zeros((1, ids.len(), vocabulary_size));
	write_sequence(tensor.index_axis_mut(Axis(0), 0), ids, 0)?;
	Ok(tensor)
}

fn hot_index(row: ArrayView1<f32>, position: usize) -> Result<usize> {
	match argmax(row.iter()) {
		Some(id) if row[id] > 0.0 => Ok(id),
		_ => Err(Error::EncodingShape(format!("position {position} has no hot entry"))),
	}
}

/// Decodes a `[batch, length, vocabulary_size]` one-hot tensor back to ids,
/// one sequence per batch row.
///
/// # Errors
/// Returns an encoding error if a position has no positive entry.
pub fn decode_sequence(tensor: ArrayView3<f32>) -> Result<Vec<Vec<usize>>> {
	tensor
		.outer_iter()
		.map(|sequence| {
			sequence
				.outer_iter()
				.enumerate()
				.map(|(position, row)| hot_index(row, position))
				.collect()
		})
		.collect()
}

/// Decodes a `[batch, vocabulary_size]` target tensor back to ids.
///
/// # Errors
/// Returns an encoding error if a row has no positive entry.
pub fn decode_targets(tensor: ArrayView2<f32>) -> Result<Vec<usize>> {
	tensor
		.outer_iter()
		.enumerate()
		.map(|(position, row)| hot_index(row, position))
		.collect()
}

/// Decodes a one-hot input tensor straight to text, one string per batch row.
///
/// Handy to check what a model is actually fed.
pub fn to_strings(tensor: ArrayView3<f32>, vocabulary: &Vocabulary) -> Result<Vec<String>> {
	decode_sequence(tensor)?
		.iter()
		.map(|ids| vocabulary.decode(ids))
		.collect()
}
