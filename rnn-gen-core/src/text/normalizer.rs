use super::CharacterStream;

/// Characters replaced by a single space during cleaning.
pub const PUNCTUATION: [char; 3] = ['!', ',', '.'];

/// Cleans raw corpus text into its canonical form.
///
/// In order:
/// - lowercases every character
/// - replaces each character of [`PUNCTUATION`] with a space
/// - replaces each `\r\n` pair with a space
/// - collapses every run of 2 or more whitespace characters into one space
///
/// A lone whitespace character (a single `\n` for instance) is kept as is.
/// Empty input gives empty output.
pub fn normalize(raw: &str) -> String {
	let lowered = raw.to_lowercase();

	let mut replaced = String::with_capacity(lowered.len());
	let mut chars = lowered.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\r' && chars.peek() == Some(&'\n') {
			chars.next();
			replaced.push(' ');
		} else if PUNCTUATION.contains(&c) {
			replaced.push(' ');
		} else {
			replaced.push(c);
		}
	}

	collapse_whitespace(&replaced)
}

/// Cleans raw text and returns it as a [`CharacterStream`].
pub fn normalize_stream(raw: &str) -> CharacterStream {
	CharacterStream::new(&normalize(raw))
}

fn collapse_whitespace(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut run: Vec<char> = Vec::new();

	for c in text.chars() {
		if c.is_whitespace() {
			run.push(c);
			continue;
		}
		flush_run(&mut output, &mut run);
		output.push(c);
	}
	flush_run(&mut output, &mut run);

	output
}

fn flush_run(output: &mut String, run: &mut Vec<char>) {
	match run.len() {
		0 => {}
		1 => output.push(run[0]),
		_ => output.push(' '),
	}
	run.clear();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_strips_punctuation() {
		assert_eq!(normalize("Fox, Socks. Box!"), "fox socks box ");
	}

	#[test]
	fn crlf_becomes_a_space() {
		assert_eq!(normalize("fox\r\nsocks"), "fox socks");
	}

	#[test]
	fn whitespace_runs_collapse() {
		assert_eq!(normalize("fox  \t socks\n\nbox"), "fox socks box");
	}

	#[test]
	fn lone_whitespace_is_kept() {
		assert_eq!(normalize("fox\nsocks\tbox"), "fox\nsocks\tbox");
	}

	#[test]
	fn punctuation_next_to_space_collapses() {
		// "knox. in" -> "knox  in" -> "knox in"
		assert_eq!(normalize("Knox. In"), "knox in");
	}

	#[test]
	fn empty_input_gives_empty_output() {
		assert_eq!(normalize(""), "");
		assert!(normalize_stream("").is_empty());
	}

	#[test]
	fn output_has_no_punctuation_or_double_whitespace() {
		let raw = "Fox\r\n\r\nIn Socks!!! ... Knox,, on   fox.\tIN\t\tbox\n";
		let clean = normalize(raw);
		assert!(!clean.chars().any(|c| PUNCTUATION.contains(&c)));
		let chars: Vec<char> = clean.chars().collect();
		for pair in chars.windows(2) {
			assert!(!(pair[0].is_whitespace() && pair[1].is_whitespace()), "{clean:?}");
		}
	}

	#[test]
	fn multibyte_characters_survive() {
		let stream = normalize_stream("Éte déjà");
		assert_eq!(stream.len(), 8);
		assert_eq!(stream[0], 'é');
	}
}
