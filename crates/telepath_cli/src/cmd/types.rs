use std::path::PathBuf;

use telepath::pack::{PackedFile, Result};

/// Print every distinct constructor name a packed document uses.
pub fn run(path: PathBuf) -> Result<()> {
	let file = PackedFile::open(&path)?;
	for name in file.root.type_names() {
		println!("{name}");
	}
	Ok(())
}
