use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Lowest temperature actually used; smaller values (0 included) are
/// clamped to it before dividing.
pub const MIN_TEMPERATURE: f64 = 1e-6;

/// Index of the largest value, ignoring NaN. Ties go to the first index.
///
/// Returns `None` if there is no comparable value.
pub fn argmax<'a, I>(values: I) -> Option<usize>
where
	I: IntoIterator<Item = &'a f32>,
{
	values
		.into_iter()
		.enumerate()
		.filter(|(_, value)| !value.is_nan())
		.fold(None, |best: Option<(usize, f32)>, (index, &value)| match best {
			Some((_, best_value)) if best_value >= value => best,
			_ => Some((index, value)),
		})
		.map(|(index, _)| index)
}

/// Draws vocabulary ids from a probability vector, with a temperature that
/// moves the draw between arg-max (near 0) and uniform (large values).
///
/// The logits are `ln(p) / T`. A probability of exactly 0 gives a logit of
/// `-inf` and can never be drawn. The draw itself inverts the cumulative
/// distribution of `exp(logit - max_logit)`.
///
/// The random source is owned by the sampler, so a seeded sampler always
/// replays the same sequence of draws.
#[derive(Debug, Clone)]
pub struct TemperatureSampler<R = StdRng> {
	rng: R,
}

impl TemperatureSampler<StdRng> {
	/// Creates a reproducible sampler.
	pub fn seeded(seed: u64) -> Self {
		Self::new(StdRng::seed_from_u64(seed))
	}

	/// Creates a sampler seeded from the operating system.
	pub fn from_entropy() -> Self {
		Self::new(StdRng::from_os_rng())
	}

	/// Seeded if `seed` is set, from entropy otherwise.
	pub fn with_seed(seed: Option<u64>) -> Self {
		match seed {
			Some(seed) => Self::seeded(seed),
			None => Self::from_entropy(),
		}
	}
}

impl<R: Rng> TemperatureSampler<R> {
	pub fn new(rng: R) -> Self {
		Self { rng }
	}

	/// Samples one id from `probabilities` at the given temperature.
	///
	/// # Errors
	/// Returns a distribution error if the vector is empty, holds a
	/// negative or NaN entry, or has no positive entry.
	pub fn sample(&mut self, probabilities: &[f32], temperature: f32) -> Result<usize> {
		let weights = scaled_weights(probabilities, temperature)?;
		let total: f64 = weights.iter().sum();

		let draw = self.rng.random::<f64>() * total;
		let mut cumulative = 0.0;
		let mut last_candidate = None;
		for (id, &weight) in weights.iter().enumerate() {
			if weight <= 0.0 {
				continue;
			}
			cumulative += weight;
			if draw < cumulative {
				return Ok(id);
			}
			last_candidate = Some(id);
		}

		// Rounding can leave `draw` just above the final sum
		last_candidate.ok_or_else(|| Error::Distribution("no entry can be drawn".to_owned()))
	}
}

/// Turns probabilities into unnormalized weights `exp(ln(p) / T - max)`.
fn scaled_weights(probabilities: &[f32], temperature: f32) -> Result<Vec<f64>> {
	if probabilities.is_empty() {
		return Err(Error::Distribution("probability vector is empty".to_owned()));
	}
	if let Some((id, p)) = probabilities.iter().enumerate().find(|(_, p)| p.is_nan() || **p < 0.0) {
		return Err(Error::Distribution(format!("probability {p} at id {id} is not a valid probability")));
	}

	let temperature = f64::from(temperature).max(MIN_TEMPERATURE);
	let logits: Vec<f64> = probabilities
		.iter()
		.map(|&p| if p > 0.0 { f64::from(p).ln() / temperature } else { f64::NEG_INFINITY })
		.collect();

	let max_logit = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	if max_logit == f64::NEG_INFINITY {
		return Err(Error::Distribution("probability vector has no positive entry".to_owned()));
	}

	Ok(logits.iter().map(|logit| (logit - max_logit).exp()).collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	const TRIALS: usize = 10_000;

	fn frequencies(probabilities: &[f32], temperature: f32, seed: u64) -> Vec<f64> {
		let mut sampler = TemperatureSampler::seeded(seed);
		let mut counts = vec![0usize; probabilities.len()];
		for _ in 0..TRIALS {
			counts[sampler.sample(probabilities, temperature).unwrap()] += 1;
		}
		counts.iter().map(|&c| c as f64 / TRIALS as f64).collect()
	}

	#[test]
	fn argmax_picks_first_largest() {
		assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
		assert_eq!(argmax(&[f32::NAN, 0.3]), Some(1));
		assert_eq!(argmax(&[] as &[f32]), None);
	}

	#[test]
	fn zero_temperature_is_effectively_argmax() {
		let freq = frequencies(&[0.9, 0.05, 0.05], 0.0, 7);
		assert!(freq[0] >= 0.999, "{freq:?}");
	}

	#[test]
	fn tiny_temperature_follows_the_largest_entry() {
		let freq = frequencies(&[0.2, 0.45, 0.35], 1e-4, 11);
		assert_eq!(freq[1], 1.0);
	}

	#[test]
	fn single_positive_entry_is_always_drawn() {
		let mut sampler = TemperatureSampler::seeded(3);
		for temperature in [0.0, 1e-6, 0.2, 1.0, 5.0, 1000.0] {
			for _ in 0..200 {
				assert_eq!(sampler.sample(&[0.0, 1.0, 0.0], temperature).unwrap(), 1);
			}
		}
	}

	#[test]
	fn unit_temperature_follows_probabilities() {
		let freq = frequencies(&[0.5, 0.3, 0.2], 1.0, 42);
		assert_abs_diff_eq!(freq[0], 0.5, epsilon = 0.03);
		assert_abs_diff_eq!(freq[1], 0.3, epsilon = 0.03);
		assert_abs_diff_eq!(freq[2], 0.2, epsilon = 0.03);
	}

	#[test]
	fn high_temperature_flattens() {
		let freq = frequencies(&[0.9, 0.1], 100.0, 5);
		assert_abs_diff_eq!(freq[0], 0.5, epsilon = 0.03);
	}

	#[test]
	fn zero_probability_is_never_drawn() {
		let freq = frequencies(&[0.0, 0.5, 0.5, 0.0], 50.0, 9);
		assert_eq!(freq[0], 0.0);
		assert_eq!(freq[3], 0.0);
	}

	#[test]
	fn seeded_samplers_replay_the_same_draws() {
		let probabilities = [0.25, 0.25, 0.25, 0.25];
		let mut a = TemperatureSampler::seeded(1234);
		let mut b = TemperatureSampler::seeded(1234);
		let draws_a: Vec<usize> = (0..100).map(|_| a.sample(&probabilities, 1.0).unwrap()).collect();
		let draws_b: Vec<usize> = (0..100).map(|_| b.sample(&probabilities, 1.0).unwrap()).collect();
		assert_eq!(draws_a, draws_b);
	}

	#[test]
	fn invalid_vectors_are_rejected() {
		let mut sampler = TemperatureSampler::seeded(0);
		assert!(matches!(sampler.sample(&[], 1.0), Err(Error::Distribution(_))));
		assert!(matches!(sampler.sample(&[0.0, 0.0], 1.0), Err(Error::Distribution(_))));
		assert!(matches!(sampler.sample(&[0.5, -0.1], 1.0), Err(Error::Distribution(_))));
		assert!(matches!(sampler.sample(&[f32::NAN, 1.0], 1.0), Err(Error::Distribution(_))));
	}
}
