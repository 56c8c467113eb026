//! End-to-end tests: corpus in, tensors, model and bundle out, text back.

use rnn_gen_core::bundle::Bundle;
use rnn_gen_core::config::{GenerationConfig, TrainingConfig};
use rnn_gen_core::dataset::one_hot::{decode_sequence, to_strings};
use rnn_gen_core::model::adapter::{FitOptions, ModelAdapter};
use rnn_gen_core::pipeline::{TrainedModel, prepare, train};
use rnn_gen_core::text::normalizer::normalize;
use rnn_gen_core::Error;

const FOX: &str = "fox socks box knox knox in box fox in socks";
const OPTIONS: FitOptions = FitOptions { epochs: 3, batch_size: 4 };

#[test]
fn fox_in_socks_scenario() {
	let cleaned = normalize(FOX);
	assert_eq!(cleaned, FOX);

	let data = prepare(FOX, 10).unwrap();

	let mut expected: Vec<char> = cleaned.chars().collect();
	expected.sort_unstable();
	expected.dedup();
	let mut actual = data.vocabulary.chars().to_vec();
	actual.sort_unstable();
	assert_eq!(actual, expected);
	assert_eq!(actual, vec![' ', 'b', 'c', 'f', 'i', 'k', 'n', 'o', 's', 'x']);

	assert_eq!(data.examples.len(), cleaned.chars().count() - 10);
	assert_eq!(data.examples.len(), 33);

	// First example's context decodes back to its 10 characters
	let first = data.inputs.slice(ndarray::s![0..1, .., ..]);
	assert_eq!(to_strings(first, &data.vocabulary).unwrap(), vec!["fox socks ".to_owned()]);
	let ids = &decode_sequence(first).unwrap()[0];
	assert_eq!(ids, &data.examples[0].context);
	assert_eq!(data.vocabulary.char_of(data.examples[0].target), Some('b'));
}

#[test]
fn every_example_decodes_to_its_substring() {
	let data = prepare(FOX, 7).unwrap();
	let chars: Vec<char> = FOX.chars().collect();
	let contexts = to_strings(data.inputs.view(), &data.vocabulary).unwrap();
	for (i, context) in contexts.iter().enumerate() {
		let expected: String = chars[i..i + 7].iter().collect();
		assert_eq!(context, &expected);
	}
}

#[test]
fn greedy_generation_replays_a_deterministic_corpus() {
	// Every 4-character window of this corpus has a single continuation
	let corpus = "abcdefgh ".repeat(6);
	let data = prepare(&corpus, 4).unwrap();
	let (trained, report) = TrainedModel::fit(data, &OPTIONS).unwrap();
	assert_eq!(report.epochs, 1);

	let config = GenerationConfig {
		seed: "abcd".to_owned(),
		sample_count: 14,
		temperature: 0.0,
		rng_seed: Some(3),
		..GenerationConfig::default()
	};
	let generated = trained.generate(&config).unwrap();
	assert_eq!(generated.seed, "abcd");
	assert_eq!(generated.text, "efgh abcdefgh ");
}

#[test]
fn generated_characters_come_from_the_vocabulary() {
	let data = prepare(FOX, 3).unwrap();
	let (trained, _) = TrainedModel::fit(data, &OPTIONS).unwrap();

	let config = GenerationConfig {
		seed: "knox in box".to_owned(),
		seed_offset: 5,
		sample_count: 200,
		temperature: 1.5,
		rng_seed: Some(99),
	};
	let generated = trained.generate(&config).unwrap();
	assert_eq!(generated.seed, "in ");
	assert_eq!(generated.text.chars().count(), 200);
	assert!(generated.text.chars().all(|c| trained.vocabulary().id_of(c).is_some()));

	// Same seed, same text
	assert_eq!(trained.generate(&config).unwrap(), generated);
}

#[test]
fn train_writes_artifacts_that_load_back() {
	let dir = tempfile::tempdir().unwrap();
	let corpus = dir.path().join("foxinsocks.txt");
	std::fs::write(&corpus, "Fox.\r\nSocks.\r\nBox.\r\nKnox.\r\n\r\nKnox in box.\r\nFox in socks.\r\n").unwrap();

	let config = TrainingConfig {
		corpus,
		model_dir: dir.path().join("model"),
		window_length: 5,
		epochs: 2,
		batch_size: 3,
	};
	let report = train(&config).unwrap();
	assert!(report.model_path.is_file());
	assert!(report.bundle_path.is_file());
	assert_eq!(report.fit.examples, report.characters - 5);

	let loaded = TrainedModel::load(&config.model_dir).unwrap();
	assert_eq!(loaded.bundle().num_examples(), report.fit.examples);
	assert_eq!(loaded.bundle().sequence_length(), 5);
	assert_eq!(loaded.vocabulary().len(), report.vocabulary_size);
	assert_eq!(loaded.model().window_length(), 5);

	let reread = Bundle::load(&report.bundle_path).unwrap();
	assert_eq!(&reread, loaded.bundle());
	assert_eq!(&reread.vocabulary().unwrap(), loaded.vocabulary());

	let generated = loaded
		.generate(&GenerationConfig {
			seed: "knox in box".to_owned(),
			sample_count: 20,
			rng_seed: Some(1),
			..GenerationConfig::default()
		})
		.unwrap();
	assert_eq!(generated.text.chars().count(), 20);
}

#[test]
fn mismatched_artifacts_fail_to_load() {
	let dir = tempfile::tempdir().unwrap();
	let (five, _) = TrainedModel::fit(prepare(FOX, 5).unwrap(), &OPTIONS).unwrap();
	let (six, _) = TrainedModel::fit(prepare(FOX, 6).unwrap(), &OPTIONS).unwrap();

	five.save(dir.path()).unwrap();
	six.bundle().save(dir.path().join("bundle.json")).unwrap();
	assert!(matches!(TrainedModel::load(dir.path()), Err(Error::Persistence(_))));
}

#[test]
fn missing_artifacts_fail_to_load() {
	let dir = tempfile::tempdir().unwrap();
	assert!(matches!(TrainedModel::load(dir.path()), Err(Error::Persistence(_))));
	assert!(matches!(TrainedModel::load(dir.path().join("nope")), Err(Error::Persistence(_))));
}

#[test]
fn missing_corpus_is_an_input_error() {
	let dir = tempfile::tempdir().unwrap();
	let config = TrainingConfig {
		corpus: dir.path().join("missing.txt"),
		model_dir: dir.path().join("model"),
		window_length: 3,
		..TrainingConfig::default()
	};
	assert!(matches!(train(&config), Err(Error::Input(_))));
}

#[test]
fn seed_outside_the_vocabulary_is_an_input_error() {
	let (trained, _) = TrainedModel::fit(prepare(FOX, 4).unwrap(), &OPTIONS).unwrap();
	let config = GenerationConfig {
		seed: "zebra".to_owned(),
		rng_seed: Some(0),
		..GenerationConfig::default()
	};
	assert!(matches!(trained.generate(&config), Err(Error::Input(_))));
}
