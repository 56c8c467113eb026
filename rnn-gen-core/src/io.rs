use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Error, Result};

/// Reads a whole UTF-8 text file into memory.
///
/// # Errors
/// Returns an input error if the file cannot be opened or is not UTF-8.
pub fn read_text<P: AsRef<Path>>(filename: P) -> Result<String> {
	let filename = filename.as_ref();
	let mut contents = String::new();
	File::open(filename)
		.and_then(|mut file| file.read_to_string(&mut contents))
		.map_err(|e| Error::Input(format!("cannot read {}: {e}", filename.display())))?;
	Ok(contents)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Creates `folder` and its parents if needed.
pub(crate) fn ensure_folder<P: AsRef<Path>>(folder: P) -> Result<()> {
	let folder = folder.as_ref();
	fs::create_dir_all(folder)
		.map_err(|e| Error::Persistence(format!("cannot create {}: {e}", folder.display())))
}

/// Fails with a persistence error if `folder` is not a directory.
pub(crate) fn expect_folder<P: AsRef<Path>>(folder: P) -> Result<()> {
	let folder = folder.as_ref();
	if !folder.is_dir() {
		return Err(Error::Persistence(format!("expected a directory, got: {}", folder.display())));
	}
	Ok(())
}
