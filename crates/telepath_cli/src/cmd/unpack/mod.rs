use std::path::PathBuf;

use telepath::pack::{PackedFile, Result, UnpackOptions, Unpacker};
use tracing::debug;

use crate::cmd::print::{PrintOptions, render_value};
use crate::cmd::util::{SeenInstances, emit_json, value_to_json_value};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
	#[arg(long = "record-types")]
	pub record_types: bool,
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
}

/// Unpack a packed document and print the resulting graph.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		json,
		record_types,
		max_depth,
	} = args;

	let file = PackedFile::open(&path)?;

	let mut options = UnpackOptions::default();
	let mut print = PrintOptions::default();
	if let Some(max_depth) = max_depth {
		options.max_depth = max_depth;
		print.max_print_depth = max_depth;
	}

	let unpacker = unpacker_for(&file, options, record_types);
	let value = unpacker.unpack(&file.root)?;

	if json {
		let mut seen = SeenInstances::default();
		let rendered = value_to_json_value(&value, &mut seen);
		let payload = UnpackJson {
			path: path.display().to_string(),
			compression: file.compression.as_str(),
			kind: value.kind(),
			instances: seen.len(),
			value: rendered,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("compression: {}", file.compression.as_str());
	println!("root: {}", value.kind());
	println!("value:");
	print!("{}", render_value(&value, 2, print));

	Ok(())
}

/// Build an unpacker for `file`, optionally registering a record factory per type name it uses.
pub(crate) fn unpacker_for(file: &PackedFile, options: UnpackOptions, record_types: bool) -> Unpacker {
	let mut unpacker = Unpacker::with_options(options);
	if record_types {
		for name in file.root.type_names() {
			unpacker.registry_mut().register_record(name);
		}
		debug!(types = unpacker.registry().len(), "registered record factories");
	}
	unpacker
}

#[derive(serde::Serialize)]
struct UnpackJson {
	path: String,
	compression: &'static str,
	kind: &'static str,
	instances: usize,
	value: serde_json::Value,
}
